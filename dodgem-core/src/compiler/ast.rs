//! AST for Dodgem compilation units

use std::collections::HashSet;

/// One parsed compilation unit: package declaration, imports, and exactly
/// one top-level class
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub class: ClassDecl,
    /// Every identifier referenced in the unit body; feeds the
    /// unused-import diagnostic
    pub used_idents: HashSet<String>,
}

impl SourceFile {
    /// Fully-qualified name of the top-level class
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.package, self.class.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    pub line: usize,
}

impl ImportDecl {
    /// Final path segment, the name an import brings into scope
    pub fn imported_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub line: usize,
    pub fields: Vec<FieldDecl>,
    pub ctor: Option<MethodDecl>,
    pub methods: Vec<MethodDecl>,
    /// Nested class declarations; each compiles to its own artifact
    pub nested: Vec<ClassDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var name = init;` / `var name;`
    VarDecl {
        name: String,
        init: Option<Expr>,
        line: usize,
    },
    /// `name = value;` or `this.name = value;`
    Assign {
        target: AssignTarget,
        value: Expr,
        line: usize,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        line: usize,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    /// `print expr;`
    Print { expr: Expr, line: usize },
    Expr { expr: Expr, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(String),
    /// `this.field`
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int {
        value: i64,
        line: usize,
    },
    Float {
        value: f64,
        line: usize,
    },
    Str {
        value: String,
        line: usize,
    },
    Bool {
        value: bool,
        line: usize,
    },
    Null {
        line: usize,
    },
    /// Bare `this`
    This {
        line: usize,
    },
    /// Local variable or parameter reference
    Var {
        name: String,
        line: usize,
    },
    /// `this.field`
    FieldAccess {
        name: String,
        line: usize,
    },
    /// `this.method(args)`
    MethodCall {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        line: usize,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    Logical {
        op: LogOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Int { line, .. }
            | Expr::Float { line, .. }
            | Expr::Str { line, .. }
            | Expr::Bool { line, .. }
            | Expr::Null { line }
            | Expr::This { line }
            | Expr::Var { line, .. }
            | Expr::FieldAccess { line, .. }
            | Expr::MethodCall { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Logical { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOp {
    And,
    Or,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqn() {
        let file = SourceFile {
            package: "com.stellariver.dodgem".to_string(),
            imports: vec![],
            class: ClassDecl {
                name: "Student".to_string(),
                line: 3,
                fields: vec![],
                ctor: None,
                methods: vec![],
                nested: vec![],
            },
            used_idents: HashSet::new(),
        };
        assert_eq!(file.fqn(), "com.stellariver.dodgem.Student");
    }

    #[test]
    fn test_imported_name() {
        let import = ImportDecl {
            path: "com.stellariver.util.Strings".to_string(),
            line: 2,
        };
        assert_eq!(import.imported_name(), "Strings");
    }
}
