//! End-to-end path through the core: lex, parse, codegen, encode, store,
//! load, and execute

use dodgem_core::binary::encode_class;
use dodgem_core::compiler::{compile_source, Lexer, Parser};
use dodgem_core::loader::{ArtifactSink, ArtifactStore, ClassLoader};
use dodgem_core::{Instance, LimitConfig, LoadError, Value, Vm};
use dodgem_log::Logger;

fn build_store(sources: &[&str]) -> ArtifactStore {
    let store = ArtifactStore::new();
    for source in sources {
        let tokens = Lexer::tokenize(source).expect("lex failure");
        let file = Parser::parse(tokens).expect("parse failure");
        let output = compile_source(&file, &Logger::noop()).expect("codegen failure");
        for image in &output.classes {
            store
                .write_artifact(&image.fqn, &encode_class(image, true))
                .expect("store write failure");
        }
    }
    store
}

const STUDENT: &str = r#"
    package com.stellariver.dodgem;
    class Student {
        var name;
        init() { this.name = "work"; }
        fn testPrint() { print this.name; }
    }
"#;

#[test]
fn student_compiles_loads_and_prints_work() {
    let store = build_store(&[STUDENT]);
    let loader = ClassLoader::new(store, Logger::noop());
    let class = loader.load("com.stellariver.dodgem.Student").unwrap();

    let instance = Instance::new(class.image());
    let mut vm = Vm::new(LimitConfig::default(), Logger::noop());
    let ctor = class.image().ctor.as_ref().unwrap();
    vm.run_method(class.image(), &instance, ctor, &[]).unwrap();
    let entry = class.image().find_method("testPrint").unwrap();
    let result = vm.run_method(class.image(), &instance, entry, &[]).unwrap();

    assert_eq!(result, Value::Null);
    assert_eq!(vm.take_output(), "work\n");
}

#[test]
fn nested_class_loads_under_dollar_name() {
    let source = r#"
        package a.b;
        class Outer {
            fn f() { return 1; }
            class Inner {
                fn g() { return 2; }
            }
        }
    "#;
    let store = build_store(&[source]);
    let loader = ClassLoader::new(store, Logger::noop());

    let inner = loader.load("a.b.Outer$Inner").unwrap();
    let instance = Instance::new(inner.image());
    let mut vm = Vm::new(LimitConfig::default(), Logger::noop());
    let entry = inner.image().find_method("g").unwrap();
    let result = vm.run_method(inner.image(), &instance, entry, &[]).unwrap();
    assert_eq!(result, Value::Int(2));
}

#[test]
fn loop_heavy_method_runs_within_limits() {
    let source = r#"
        package a;
        class Counter {
            var total;
            init() { this.total = 0; }
            fn count(n) {
                var i = 0;
                while (i < n) {
                    i = i + 1;
                    this.total = this.total + i;
                }
                return this.total;
            }
        }
    "#;
    let store = build_store(&[source]);
    let loader = ClassLoader::new(store, Logger::noop());
    let class = loader.load("a.Counter").unwrap();

    let instance = Instance::new(class.image());
    let mut vm = Vm::new(LimitConfig::default(), Logger::noop());
    let ctor = class.image().ctor.as_ref().unwrap();
    vm.run_method(class.image(), &instance, ctor, &[]).unwrap();
    let entry = class.image().find_method("count").unwrap();
    let result = vm
        .run_method(class.image(), &instance, entry, &[Value::Int(100)])
        .unwrap();
    assert_eq!(result, Value::Int(5050));
}

#[test]
fn two_loaders_same_bytes_distinct_identity() {
    let first = ClassLoader::new(build_store(&[STUDENT]), Logger::noop());
    let second = ClassLoader::new(build_store(&[STUDENT]), Logger::noop());

    let left = first.load("com.stellariver.dodgem.Student").unwrap();
    let right = second.load("com.stellariver.dodgem.Student").unwrap();

    // Same behavior
    for class in [&left, &right] {
        let instance = Instance::new(class.image());
        let mut vm = Vm::new(LimitConfig::default(), Logger::noop());
        let ctor = class.image().ctor.as_ref().unwrap();
        vm.run_method(class.image(), &instance, ctor, &[]).unwrap();
        let entry = class.image().find_method("testPrint").unwrap();
        vm.run_method(class.image(), &instance, entry, &[]).unwrap();
        assert_eq!(vm.take_output(), "work\n");
    }
    // Different identity
    assert_ne!(left.type_id(), right.type_id());
}

#[test]
fn tampered_store_bytes_fail_verification() {
    let store = build_store(&[STUDENT]);
    let fqn = "com.stellariver.dodgem.Student";
    let mut bytes = store.get(fqn).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x55;
    store.write_artifact(fqn, &bytes).unwrap();

    let loader = ClassLoader::new(store, Logger::noop());
    assert!(matches!(
        loader.load(fqn).unwrap_err(),
        LoadError::VerificationFailure { .. }
    ));
}
