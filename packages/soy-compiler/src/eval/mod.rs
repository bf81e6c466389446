//! Expression evaluator (spec.md §4.7): a tree-walking interpreter over
//! [`crate::ast::ExprNodeKind`], shared by the optimiser's constant folder
//! (§4.8) and usable standalone wherever compile-time evaluation of a
//! closed expression is needed.

mod value;

pub use value::Value;

use std::collections::HashMap;

use crate::ast::{Arena, BinaryOp, ExprNodeKind, Node, UnaryOp};
use crate::error::{CompilerError, Result};
use crate::node::{Identifier, NodeId};
use crate::types::proto::ProtoRegistry;

/// Bindings visible to the expression being evaluated: template params,
/// `{let}` locals, and loop variables, plus `@param`-injected values.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn child(&self) -> Environment {
        self.clone()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

pub struct Evaluator<'a> {
    arena: &'a Arena,
    protos: Option<&'a ProtoRegistry>,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Evaluator { arena, protos: None }
    }

    pub fn with_protos(arena: &'a Arena, protos: &'a ProtoRegistry) -> Self {
        Evaluator {
            arena,
            protos: Some(protos),
        }
    }

    pub fn eval(&self, id: NodeId, env: &Environment) -> Result<Value> {
        let node = match &self.arena.get(id).data {
            Node::Expr(e) => e,
            other => {
                return Err(CompilerError::AssertionFailure(format!(
                    "eval() called on a non-expression node {:?}",
                    other
                )))
            }
        };
        self.eval_kind(node, env)
    }

    fn eval_kind(&self, node: &ExprNodeKind, env: &Environment) -> Result<Value> {
        match node {
            ExprNodeKind::NullLiteral => Ok(Value::Null),
            ExprNodeKind::BoolLiteral(b) => Ok(Value::Bool(*b)),
            ExprNodeKind::IntLiteral(i) => Ok(Value::Int(*i)),
            ExprNodeKind::FloatLiteral(f) => Ok(Value::Float(*f)),
            ExprNodeKind::StringLiteral(s) => Ok(Value::Str(s.clone())),
            ExprNodeKind::ProtoEnumLiteral { fqn, member } => Ok(Value::EnumValue {
                fqn: fqn.clone(),
                member: member.clone(),
            }),

            ExprNodeKind::ListLiteral { items } => {
                let values = items
                    .iter()
                    .map(|id| self.eval(*id, env))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(values))
            }
            ExprNodeKind::RecordLiteral { fields } => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, id) in fields {
                    out.push((name.clone(), self.eval(*id, env)?));
                }
                Ok(Value::Record(out))
            }
            ExprNodeKind::MapLiteral { entries } => {
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    out.push((self.eval(*k, env)?, self.eval(*v, env)?));
                }
                Ok(Value::Map(out))
            }
            ExprNodeKind::ListComprehension { .. } => {
                // Comprehensions depend on loop iteration, which the
                // optimiser's constant folder never has a closed input for;
                // left to the runtime backend (spec.md §1 "code emission ...
                // out of scope").
                Err(CompilerError::AssertionFailure(
                    "list comprehensions are not evaluable at compile time".into(),
                ))
            }

            ExprNodeKind::VarRef(Identifier { name, .. }) => env
                .lookup(name)
                .cloned()
                .ok_or_else(|| CompilerError::AssertionFailure(format!("unbound variable ${name}"))),
            ExprNodeKind::Global(Identifier { name, .. }) => env
                .lookup(name)
                .cloned()
                .ok_or_else(|| CompilerError::AssertionFailure(format!("unresolved global {name}"))),

            ExprNodeKind::FieldAccess { base, field } => {
                let base_val = self.eval(*base, env)?;
                base_val.field(&field.name)
            }
            ExprNodeKind::NullSafeFieldAccess { base, field } => {
                let base_val = self.eval(*base, env)?;
                if base_val.is_null() {
                    Ok(Value::Null)
                } else {
                    base_val.field(&field.name)
                }
            }
            ExprNodeKind::ItemAccess { base, index } => {
                let base_val = self.eval(*base, env)?;
                let index_val = self.eval(*index, env)?;
                base_val.item(&index_val)
            }
            ExprNodeKind::NullSafeItemAccess { base, index } => {
                let base_val = self.eval(*base, env)?;
                if base_val.is_null() {
                    Ok(Value::Null)
                } else {
                    let index_val = self.eval(*index, env)?;
                    base_val.item(&index_val)
                }
            }
            ExprNodeKind::MethodCall { base, method, args } => {
                let base_val = self.eval(*base, env)?;
                let arg_vals = args
                    .iter()
                    .map(|id| self.eval(*id, env))
                    .collect::<Result<Vec<_>>>()?;
                base_val.call_method(&method.name, &arg_vals)
            }
            ExprNodeKind::AssertNonNull { base } => {
                let val = self.eval(*base, env)?;
                if val.is_null() {
                    Err(CompilerError::AssertionFailure("non-null assertion (`!`) failed on null".into()))
                } else {
                    Ok(val)
                }
            }

            ExprNodeKind::Unary { op, operand } => {
                let val = self.eval(*operand, env)?;
                match op {
                    UnaryOp::Neg => val.negate(),
                    UnaryOp::Not => Ok(Value::Bool(!val.truthy())),
                }
            }
            ExprNodeKind::Binary { op, left, right } => self.eval_binary(*op, *left, *right, env),
            ExprNodeKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let c = self.eval(*cond, env)?;
                if c.truthy() {
                    self.eval(*then_branch, env)
                } else {
                    self.eval(*else_branch, env)
                }
            }
            ExprNodeKind::NullCoalesce { left, right } => {
                let l = self.eval(*left, env)?;
                if l.is_null() {
                    self.eval(*right, env)
                } else {
                    Ok(l)
                }
            }

            ExprNodeKind::FunctionCall { name, args } => {
                let arg_vals = args
                    .iter()
                    .map(|id| self.eval(*id, env))
                    .collect::<Result<Vec<_>>>()?;
                call_builtin_function(&name.name, &arg_vals)
            }
            ExprNodeKind::TemplateLiteral { name } => Ok(Value::TemplateRef(name.name.clone())),
            ExprNodeKind::ProtoInit { fqn, fields } => {
                if let Some(protos) = self.protos {
                    protos.message(fqn)?;
                }
                let mut out = Vec::with_capacity(fields.len());
                for (name, id) in fields {
                    out.push((name.clone(), self.eval(*id, env)?));
                }
                Ok(Value::Proto {
                    fqn: fqn.clone(),
                    fields: out,
                })
            }
        }
    }

    /// Short-circuits `and`/`or`; spec.md §4.7 requires this even at
    /// compile-time-fold time so a side-effect-free but erroring right
    /// operand (e.g. an out-of-range index) doesn't block folding the left.
    fn eval_binary(&self, op: BinaryOp, left: NodeId, right: NodeId, env: &Environment) -> Result<Value> {
        if op == BinaryOp::And {
            let l = self.eval(left, env)?;
            return if !l.truthy() { Ok(l) } else { self.eval(right, env) };
        }
        if op == BinaryOp::Or {
            let l = self.eval(left, env)?;
            return if l.truthy() { Ok(l) } else { self.eval(right, env) };
        }
        let l = self.eval(left, env)?;
        let r = self.eval(right, env)?;
        match op {
            BinaryOp::Add => l.add(&r),
            BinaryOp::Sub => l.arith(&r, |a, b| a - b, |a, b| a - b),
            BinaryOp::Mul => l.arith(&r, |a, b| a * b, |a, b| a * b),
            BinaryOp::Div => l.divide(&r),
            BinaryOp::Mod => l.modulo(&r),
            BinaryOp::Lt => l.compare(&r).map(|o| Value::Bool(o.is_lt())),
            BinaryOp::Le => l.compare(&r).map(|o| Value::Bool(o.is_le())),
            BinaryOp::Gt => l.compare(&r).map(|o| Value::Bool(o.is_gt())),
            BinaryOp::Ge => l.compare(&r).map(|o| Value::Bool(o.is_ge())),
            // `==`/`!=` use loose, coercing equality (spec.md §4.7: numeric
            // strings compare equal to numbers, `null == undefined`-style
            // identity does not apply since Soy has no `undefined`).
            BinaryOp::Eq => Ok(Value::Bool(l.loose_eq(&r))),
            BinaryOp::Ne => Ok(Value::Bool(!l.loose_eq(&r))),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }
}

fn call_builtin_function(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "length" => match args.first() {
            Some(Value::List(items)) => Ok(Value::Int(items.len() as i64)),
            Some(Value::Str(s)) => Ok(Value::Int(s.chars().count() as i64)),
            _ => Err(CompilerError::AssertionFailure("length() expects a list or string".into())),
        },
        "isFirst" | "isLast" | "index" => {
            // Loop-scoped builtins; only meaningful inside a `{for}` body
            // where the pass manager binds `$__index__<var>` into the
            // environment (spec.md §4.6). Constant-folding never sees these
            // resolved, so treat as non-foldable here.
            Err(CompilerError::AssertionFailure(format!("{name}() is not foldable outside a loop body")))
        }
        "keys" => match args.first() {
            Some(Value::Map(entries)) => Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect())),
            _ => Err(CompilerError::AssertionFailure("keys() expects a map".into())),
        },
        other => Err(CompilerError::AssertionFailure(format!("unknown function {other}()"))),
    }
}
