//! Bytecode generation from the AST
//!
//! Each class declaration, nested ones included, becomes its own
//! [`ClassImage`]. Method bodies compile to stack bytecode; locals get
//! fixed slots that are never reused, so the slot count is an upper bound
//! on live variables.

use std::collections::HashSet;
use std::sync::Arc;

use dodgem_config::Phase;
use dodgem_log::{debug, Logger};

use super::ast::{
    AssignTarget, BinOp, ClassDecl, Expr, LogOp, MethodDecl, SourceFile, Stmt, UnOp,
};
use super::diagnostics::Diagnostic;
use crate::runtime::image::{ClassImage, MethodImage};
use crate::runtime::opcode::OpCode;
use crate::runtime::value::Value;
use crate::runtime::Chunk;

#[derive(Debug, Clone, PartialEq)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodegenErrorKind {
    UnknownField(String),
    UnknownVariable(String),
    DuplicateField(String),
    DuplicateMethod(String),
    DuplicateVariable(String),
    TooManyConstants,
    TooManyLocals,
    TooManyParams,
    TooManyArgs,
    JumpTooLarge,
    /// Bare `this` outside field access or method call position
    InvalidThis,
}

impl CodegenError {
    fn at(kind: CodegenErrorKind, line: usize) -> Self {
        Self { kind, line }
    }

    /// Message without the line prefix
    pub fn message(&self) -> String {
        match &self.kind {
            CodegenErrorKind::UnknownField(name) => format!("Unknown field '{name}'"),
            CodegenErrorKind::UnknownVariable(name) => format!("Unknown variable '{name}'"),
            CodegenErrorKind::DuplicateField(name) => format!("Duplicate field '{name}'"),
            CodegenErrorKind::DuplicateMethod(name) => format!("Duplicate method '{name}'"),
            CodegenErrorKind::DuplicateVariable(name) => {
                format!("Variable '{name}' is already declared in this scope")
            }
            CodegenErrorKind::TooManyConstants => {
                "Too many constants in one method (max 256)".to_string()
            }
            CodegenErrorKind::TooManyLocals => {
                "Too many local variables in one method (max 256)".to_string()
            }
            CodegenErrorKind::TooManyParams => "Too many parameters (max 255)".to_string(),
            CodegenErrorKind::TooManyArgs => "Too many call arguments (max 255)".to_string(),
            CodegenErrorKind::JumpTooLarge => "Jump distance too large".to_string(),
            CodegenErrorKind::InvalidThis => {
                "'this' may only be used for field access or method calls".to_string()
            }
        }
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {}] {}", self.line, self.message())
    }
}

impl std::error::Error for CodegenError {}

#[derive(Debug)]
pub struct CodegenOutput {
    pub classes: Vec<ClassImage>,
    pub warnings: Vec<Diagnostic>,
}

/// Compile one parsed unit into class images plus any warnings
pub fn compile_source(
    file: &SourceFile,
    logger: &Arc<Logger>,
) -> Result<CodegenOutput, CodegenError> {
    let fqn = file.fqn();
    let mut classes = Vec::new();
    compile_class(&file.class, &file.package, false, &mut classes)?;

    let mut warnings = Vec::new();
    for import in &file.imports {
        if !file.used_idents.contains(import.imported_name()) {
            warnings.push(
                Diagnostic::warning(&fqn, format!("Unused import '{}'", import.path))
                    .with_line(import.line),
            );
        }
    }
    collect_field_warnings(&file.class, &fqn, &file.used_idents, &mut warnings);

    debug!(
        logger,
        target: Phase::Codegen.target(),
        "codegen {}: {} class(es), {} warning(s)",
        fqn,
        classes.len(),
        warnings.len()
    );
    Ok(CodegenOutput { classes, warnings })
}

fn collect_field_warnings(
    class: &ClassDecl,
    unit_name: &str,
    used: &HashSet<String>,
    warnings: &mut Vec<Diagnostic>,
) {
    for field in &class.fields {
        if !used.contains(&field.name) {
            warnings.push(
                Diagnostic::warning(
                    unit_name,
                    format!("Field '{}' is never used", field.name),
                )
                .with_line(field.line),
            );
        }
    }
    for nested in &class.nested {
        collect_field_warnings(nested, unit_name, used, warnings);
    }
}

fn compile_class(
    class: &ClassDecl,
    prefix: &str,
    nested: bool,
    out: &mut Vec<ClassImage>,
) -> Result<(), CodegenError> {
    let separator = if nested { "$" } else { "." };
    let fqn = format!("{prefix}{separator}{}", class.name);

    let mut fields = Vec::new();
    let mut seen_fields = HashSet::new();
    for field in &class.fields {
        if !seen_fields.insert(field.name.clone()) {
            return Err(CodegenError::at(
                CodegenErrorKind::DuplicateField(field.name.clone()),
                field.line,
            ));
        }
        fields.push(field.name.clone());
    }

    let mut seen_methods = HashSet::new();
    for method in &class.methods {
        if !seen_methods.insert(method.name.clone()) {
            return Err(CodegenError::at(
                CodegenErrorKind::DuplicateMethod(method.name.clone()),
                method.line,
            ));
        }
    }

    let field_set: HashSet<&str> = fields.iter().map(|s| s.as_str()).collect();
    let ctor = class
        .ctor
        .as_ref()
        .map(|decl| compile_method(decl, &field_set))
        .transpose()?;
    let methods = class
        .methods
        .iter()
        .map(|decl| compile_method(decl, &field_set))
        .collect::<Result<Vec<_>, _>>()?;

    out.push(ClassImage {
        fqn: fqn.clone(),
        fields,
        ctor,
        methods,
    });

    for inner in &class.nested {
        compile_class(inner, &fqn, true, out)?;
    }
    Ok(())
}

struct Local {
    name: String,
    depth: usize,
    alive: bool,
}

/// Per-method compiler state
struct FunctionCompiler<'a> {
    chunk: Chunk,
    locals: Vec<Local>,
    scope_depth: usize,
    fields: &'a HashSet<&'a str>,
}

fn compile_method(
    decl: &MethodDecl,
    fields: &HashSet<&str>,
) -> Result<MethodImage, CodegenError> {
    let arity = u8::try_from(decl.params.len())
        .map_err(|_| CodegenError::at(CodegenErrorKind::TooManyParams, decl.line))?;

    let mut compiler = FunctionCompiler {
        chunk: Chunk::new(),
        locals: Vec::new(),
        scope_depth: 0,
        fields,
    };
    for param in &decl.params {
        compiler.declare_local(param, decl.line)?;
    }
    for stmt in &decl.body {
        compiler.statement(stmt)?;
    }
    // Implicit null return for bodies that fall off the end
    compiler.chunk.write_op(OpCode::Return, decl.line);

    let local_count = u8::try_from(compiler.locals.len())
        .map_err(|_| CodegenError::at(CodegenErrorKind::TooManyLocals, decl.line))?;
    Ok(MethodImage {
        name: decl.name.clone(),
        arity,
        local_count,
        chunk: compiler.chunk,
    })
}

impl FunctionCompiler<'_> {
    fn declare_local(&mut self, name: &str, line: usize) -> Result<u8, CodegenError> {
        let duplicate = self
            .locals
            .iter()
            .any(|local| local.alive && local.depth == self.scope_depth && local.name == name);
        if duplicate {
            return Err(CodegenError::at(
                CodegenErrorKind::DuplicateVariable(name.to_string()),
                line,
            ));
        }
        let slot = u8::try_from(self.locals.len())
            .map_err(|_| CodegenError::at(CodegenErrorKind::TooManyLocals, line))?;
        self.locals.push(Local {
            name: name.to_string(),
            depth: self.scope_depth,
            alive: true,
        });
        Ok(slot)
    }

    /// Innermost live local with the given name
    fn resolve_local(&self, name: &str) -> Option<u8> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.alive && local.name == name)
            .map(|(slot, _)| slot as u8)
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Slots stay allocated after their scope ends; the names just stop
    /// resolving
    fn end_scope(&mut self) {
        for local in &mut self.locals {
            if local.depth == self.scope_depth {
                local.alive = false;
            }
        }
        self.scope_depth -= 1;
    }

    fn constant(&mut self, value: Value, line: usize) -> Result<u8, CodegenError> {
        self.chunk
            .add_constant(value)
            .ok_or_else(|| CodegenError::at(CodegenErrorKind::TooManyConstants, line))
    }

    fn name_constant(&mut self, name: &str, line: usize) -> Result<u8, CodegenError> {
        self.constant(Value::Str(name.to_string()), line)
    }

    fn check_field(&self, name: &str, line: usize) -> Result<(), CodegenError> {
        if self.fields.contains(name) {
            Ok(())
        } else {
            Err(CodegenError::at(
                CodegenErrorKind::UnknownField(name.to_string()),
                line,
            ))
        }
    }

    fn patch(&mut self, operand_offset: usize, line: usize) -> Result<(), CodegenError> {
        if self.chunk.patch_jump(operand_offset) {
            Ok(())
        } else {
            Err(CodegenError::at(CodegenErrorKind::JumpTooLarge, line))
        }
    }

    fn block(&mut self, body: &[Stmt]) -> Result<(), CodegenError> {
        self.begin_scope();
        for stmt in body {
            self.statement(stmt)?;
        }
        self.end_scope();
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::VarDecl { name, init, line } => {
                match init {
                    Some(expr) => self.expression(expr)?,
                    None => self.chunk.write_op(OpCode::Null, *line),
                }
                let slot = self.declare_local(name, *line)?;
                self.chunk.write_op_u8(OpCode::SetLocal, slot, *line);
            }
            Stmt::Assign {
                target,
                value,
                line,
            } => match target {
                AssignTarget::Local(name) => {
                    let slot = self.resolve_local(name).ok_or_else(|| {
                        CodegenError::at(
                            CodegenErrorKind::UnknownVariable(name.clone()),
                            *line,
                        )
                    })?;
                    self.expression(value)?;
                    self.chunk.write_op_u8(OpCode::SetLocal, slot, *line);
                }
                AssignTarget::Field(name) => {
                    self.check_field(name, *line)?;
                    let index = self.name_constant(name, *line)?;
                    self.expression(value)?;
                    self.chunk.write_op_u8(OpCode::SetField, index, *line);
                }
            },
            Stmt::If {
                cond,
                then_body,
                else_body,
                line,
            } => {
                self.expression(cond)?;
                let to_else = self.chunk.write_jump(OpCode::JumpIfFalse, *line);
                self.chunk.write_op(OpCode::Pop, *line);
                self.block(then_body)?;
                let to_end = self.chunk.write_jump(OpCode::Jump, *line);
                self.patch(to_else, *line)?;
                self.chunk.write_op(OpCode::Pop, *line);
                if let Some(else_body) = else_body {
                    self.block(else_body)?;
                }
                self.patch(to_end, *line)?;
            }
            Stmt::While { cond, body, line } => {
                let start = self.chunk.current_offset();
                self.expression(cond)?;
                let to_exit = self.chunk.write_jump(OpCode::JumpIfFalse, *line);
                self.chunk.write_op(OpCode::Pop, *line);
                self.block(body)?;
                if !self.chunk.write_loop(start, *line) {
                    return Err(CodegenError::at(CodegenErrorKind::JumpTooLarge, *line));
                }
                self.patch(to_exit, *line)?;
                self.chunk.write_op(OpCode::Pop, *line);
            }
            Stmt::Return { value, line } => match value {
                Some(expr) => {
                    self.expression(expr)?;
                    self.chunk.write_op(OpCode::ReturnValue, *line);
                }
                None => self.chunk.write_op(OpCode::Return, *line),
            },
            Stmt::Print { expr, line } => {
                self.expression(expr)?;
                self.chunk.write_op(OpCode::Print, *line);
            }
            Stmt::Expr { expr, line } => {
                self.expression(expr)?;
                self.chunk.write_op(OpCode::Pop, *line);
            }
        }
        Ok(())
    }

    fn expression(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match expr {
            Expr::Int { value, line } => {
                let index = self.constant(Value::Int(*value), *line)?;
                self.chunk.write_op_u8(OpCode::Constant, index, *line);
            }
            Expr::Float { value, line } => {
                let index = self.constant(Value::Float(*value), *line)?;
                self.chunk.write_op_u8(OpCode::Constant, index, *line);
            }
            Expr::Str { value, line } => {
                let index = self.constant(Value::Str(value.clone()), *line)?;
                self.chunk.write_op_u8(OpCode::Constant, index, *line);
            }
            Expr::Bool { value, line } => {
                let op = if *value { OpCode::True } else { OpCode::False };
                self.chunk.write_op(op, *line);
            }
            Expr::Null { line } => self.chunk.write_op(OpCode::Null, *line),
            Expr::This { line } => {
                return Err(CodegenError::at(CodegenErrorKind::InvalidThis, *line))
            }
            Expr::Var { name, line } => {
                let slot = self.resolve_local(name).ok_or_else(|| {
                    CodegenError::at(CodegenErrorKind::UnknownVariable(name.clone()), *line)
                })?;
                self.chunk.write_op_u8(OpCode::GetLocal, slot, *line);
            }
            Expr::FieldAccess { name, line } => {
                self.check_field(name, *line)?;
                let index = self.name_constant(name, *line)?;
                self.chunk.write_op_u8(OpCode::GetField, index, *line);
            }
            Expr::MethodCall { name, args, line } => {
                let argc = u8::try_from(args.len())
                    .map_err(|_| CodegenError::at(CodegenErrorKind::TooManyArgs, *line))?;
                let index = self.name_constant(name, *line)?;
                for arg in args {
                    self.expression(arg)?;
                }
                self.chunk.write_op_u8_u8(OpCode::Invoke, index, argc, *line);
            }
            Expr::Unary { op, operand, line } => {
                self.expression(operand)?;
                let op = match op {
                    UnOp::Neg => OpCode::Negate,
                    UnOp::Not => OpCode::Not,
                };
                self.chunk.write_op(op, *line);
            }
            Expr::Binary { op, lhs, rhs, line } => {
                self.expression(lhs)?;
                self.expression(rhs)?;
                let op = match op {
                    BinOp::Add => OpCode::Add,
                    BinOp::Sub => OpCode::Subtract,
                    BinOp::Mul => OpCode::Multiply,
                    BinOp::Div => OpCode::Divide,
                    BinOp::Eq => OpCode::Equal,
                    BinOp::Ne => OpCode::NotEqual,
                    BinOp::Lt => OpCode::Less,
                    BinOp::Le => OpCode::LessEqual,
                    BinOp::Gt => OpCode::Greater,
                    BinOp::Ge => OpCode::GreaterEqual,
                };
                self.chunk.write_op(op, *line);
            }
            Expr::Logical { op, lhs, rhs, line } => {
                self.expression(lhs)?;
                match op {
                    LogOp::And => {
                        // Short circuit: keep lhs when falsey
                        let to_end = self.chunk.write_jump(OpCode::JumpIfFalse, *line);
                        self.chunk.write_op(OpCode::Pop, *line);
                        self.expression(rhs)?;
                        self.patch(to_end, *line)?;
                    }
                    LogOp::Or => {
                        let to_rhs = self.chunk.write_jump(OpCode::JumpIfFalse, *line);
                        let to_end = self.chunk.write_jump(OpCode::Jump, *line);
                        self.patch(to_rhs, *line)?;
                        self.chunk.write_op(OpCode::Pop, *line);
                        self.expression(rhs)?;
                        self.patch(to_end, *line)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::Parser;
    use crate::runtime::object::Instance;
    use crate::runtime::vm::Vm;
    use dodgem_config::LimitConfig;

    fn compile(source: &str) -> Result<CodegenOutput, CodegenError> {
        let tokens = Lexer::tokenize(source).expect("lex failure");
        let file = Parser::parse(tokens).expect("parse failure");
        compile_source(&file, &Logger::noop())
    }

    /// Compile, construct, and invoke; returns (return value, print output)
    fn run(source: &str, method: &str, args: &[Value]) -> (Value, String) {
        let output = compile(source).expect("codegen failure");
        let image = &output.classes[0];
        let instance = Instance::new(image);
        let mut vm = Vm::new(LimitConfig::default(), Logger::noop());
        if let Some(ctor) = &image.ctor {
            vm.run_method(image, &instance, ctor, &[]).expect("ctor failure");
        }
        let entry = image.find_method(method).expect("method not found");
        let value = vm
            .run_method(image, &instance, entry, args)
            .expect("run failure");
        (value, vm.take_output())
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
    fn test_student_prints_work() {
        let (value, output) = run(STUDENT, "testPrint", &[]);
        assert_eq!(value, Value::Null);
        assert_eq!(output, "work\n");
    }

    #[test]
    fn test_student_image_shape() {
        let output = compile(STUDENT).unwrap();
        assert_eq!(output.classes.len(), 1);
        let image = &output.classes[0];
        assert_eq!(image.fqn, "com.stellariver.dodgem.Student");
        assert_eq!(image.fields, vec!["name".to_string()]);
        assert!(image.ctor.is_some());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_while_loop_sums() {
        let source = r#"
            package a;
            class Summer {
                fn sum(n) {
                    var total = 0;
                    var i = 1;
                    while (i <= n) {
                        total = total + i;
                        i = i + 1;
                    }
                    return total;
                }
            }
        "#;
        let (value, _) = run(source, "sum", &[Value::Int(10)]);
        assert_eq!(value, Value::Int(55));
    }

    #[test]
    fn test_if_else_branches() {
        let source = r#"
            package a;
            class Chooser {
                fn pick(flag) {
                    if (flag) { return "yes"; } else { return "no"; }
                }
            }
        "#;
        let (value, _) = run(source, "pick", &[Value::Bool(true)]);
        assert_eq!(value, Value::Str("yes".to_string()));
        let (value, _) = run(source, "pick", &[Value::Bool(false)]);
        assert_eq!(value, Value::Str("no".to_string()));
    }

    #[test]
    fn test_logical_short_circuit() {
        let source = r#"
            package a;
            class Logic {
                fn check(a, b) { return a and b or "fallback"; }
            }
        "#;
        let (value, _) = run(source, "check", &[Value::Bool(true), Value::Int(5)]);
        assert_eq!(value, Value::Int(5));
        let (value, _) = run(source, "check", &[Value::Bool(false), Value::Int(5)]);
        assert_eq!(value, Value::Str("fallback".to_string()));
    }

    #[test]
    fn test_method_calls_method() {
        let source = r#"
            package a;
            class Doubler {
                fn twice(n) { return this.double(this.double(n)); }
                fn double(n) { return n * 2; }
            }
        "#;
        let (value, _) = run(source, "twice", &[Value::Int(3)]);
        assert_eq!(value, Value::Int(12));
    }

    #[test]
    fn test_nested_class_images() {
        let source = r#"
            package a.b;
            class Outer {
                fn f() { return 1; }
                class Inner {
                    fn g() { return 2; }
                }
            }
        "#;
        let output = compile(source).unwrap();
        let fqns: Vec<_> = output.classes.iter().map(|c| c.fqn.as_str()).collect();
        assert_eq!(fqns, vec!["a.b.Outer", "a.b.Outer$Inner"]);
    }

    #[test]
    fn test_unknown_variable() {
        let err = compile("package a; class X { fn f() { return missing; } }").unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::UnknownVariable(_)));
    }

    #[test]
    fn test_unknown_field() {
        let err =
            compile("package a; class X { fn f() { return this.ghost; } }").unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::UnknownField(_)));
    }

    #[test]
    fn test_duplicate_field() {
        let err = compile("package a; class X { var x; var x; }").unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::DuplicateField(_)));
    }

    #[test]
    fn test_duplicate_method() {
        let err =
            compile("package a; class X { fn f() { } fn f() { } }").unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::DuplicateMethod(_)));
    }

    #[test]
    fn test_bare_this_rejected() {
        let err = compile("package a; class X { fn f() { print this; } }").unwrap_err();
        assert!(matches!(err.kind, CodegenErrorKind::InvalidThis));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_scoped_shadowing() {
        let source = r#"
            package a;
            class Scopes {
                fn f() {
                    var x = 1;
                    if (true) {
                        var x = 2;
                    }
                    return x;
                }
            }
        "#;
        let (value, _) = run(source, "f", &[]);
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn test_unused_import_warning() {
        let output =
            compile("package a; import b.Helper; class X { fn f() { return 1; } }").unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("Unused import 'b.Helper'"));
    }

    #[test]
    fn test_unused_field_warning() {
        let output = compile("package a; class X { var dormant; }").unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("'dormant'"));
    }
}
