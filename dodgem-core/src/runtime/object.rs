//! Object instances

use std::cell::RefCell;
use std::collections::HashMap;

use super::image::ClassImage;
use super::value::Value;

/// One constructed instance. Fields use interior mutability so method
/// invocations only need a shared borrow of the instance.
#[derive(Debug)]
pub struct Instance {
    class: String,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    /// Allocate an instance with every declared field set to null
    pub fn new(image: &ClassImage) -> Self {
        let fields = image
            .fields
            .iter()
            .map(|name| (name.clone(), Value::Null))
            .collect();
        Self {
            class: image.fqn.clone(),
            fields: RefCell::new(fields),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    /// Write a declared field; returns false for undeclared names
    pub fn set_field(&self, name: &str, value: Value) -> bool {
        match self.fields.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_image() -> ClassImage {
        ClassImage {
            fqn: "com.stellariver.dodgem.Student".to_string(),
            fields: vec!["name".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_fields_default_to_null() {
        let instance = Instance::new(&student_image());
        assert_eq!(instance.get_field("name"), Some(Value::Null));
        assert_eq!(instance.get_field("missing"), None);
    }

    #[test]
    fn test_set_declared_field() {
        let instance = Instance::new(&student_image());
        assert!(instance.set_field("name", Value::Str("work".to_string())));
        assert_eq!(
            instance.get_field("name"),
            Some(Value::Str("work".to_string()))
        );
    }

    #[test]
    fn test_set_undeclared_field_rejected() {
        let instance = Instance::new(&student_image());
        assert!(!instance.set_field("age", Value::Int(1)));
    }
}
