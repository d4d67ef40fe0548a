use crate::lex::Number;
use std::fmt;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::GtEq => ">=",
        };
        f.write_str(symbol)
    }
}

/// Syntax tree built by the parser. Every node owns its children; blocks
/// and programs own their statements in source order.
#[derive(PartialEq, Debug, Clone)]
pub enum AST {
    Program(Vec<AST>),
    Number(Number),
    String(String),
    Identifier(String),
    Assign {
        name: String,
        value: Box<AST>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<AST>,
        right: Box<AST>,
    },
    FunctionCall {
        name: String,
        args: Vec<AST>,
    },
    If {
        condition: Box<AST>,
        then_block: Box<AST>,
        else_block: Option<Box<AST>>,
    },
    While {
        condition: Box<AST>,
        body: Box<AST>,
    },
    Define {
        name: String,
        params: Vec<String>,
        body: Box<AST>,
    },
    Return(Box<AST>),
    Recurse(Vec<AST>),
    Modify {
        target: String,
        code: Box<AST>,
    },
    Block(Vec<AST>),
}
