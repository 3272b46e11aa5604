//! ASCII tree rendering for expression trees.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;
use std::sync::Arc;

use ptree::{Style, TreeItem};

use crate::{DimSet, Expr, Op};

/// Renderer that expands every occurrence of a shared subtree.
#[derive(Clone)]
pub struct ExprTreeFull {
    expr: Arc<Expr>,
}

impl TreeItem for ExprTreeFull {
    type Child = ExprTreeFull;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        write!(f, "{}", format_node(&self.expr))
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Owned(self.expr.sources().into_iter().map(|src| ExprTreeFull { expr: src.clone() }).collect())
    }
}

/// Renderer that prints a subtree seen before as `[id] → (see above)`.
#[derive(Clone)]
pub struct ExprTreeCompact {
    expr: Arc<Expr>,
    visited: Rc<RefCell<HashSet<u64>>>,
    is_backref: RefCell<bool>,
}

impl TreeItem for ExprTreeCompact {
    type Child = ExprTreeCompact;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        if !self.visited.borrow_mut().insert(self.expr.id) {
            *self.is_backref.borrow_mut() = true;
            return write!(f, "[{}] → (see above)", self.expr.id);
        }
        write!(f, "{}", format_node(&self.expr))
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        if *self.is_backref.borrow() {
            return Cow::Borrowed(&[]);
        }
        let children = self
            .expr
            .sources()
            .into_iter()
            .map(|src| ExprTreeCompact {
                expr: src.clone(),
                visited: Rc::clone(&self.visited),
                is_backref: RefCell::new(false),
            })
            .collect();
        Cow::Owned(children)
    }
}

fn format_dims(dims: &DimSet) -> String {
    let names: Vec<&str> = dims.iter().map(|d| d.name()).collect();
    format!("{{{}}}", names.join(", "))
}

/// `[id] LABEL : {free dims}`
fn format_node(expr: &Expr) -> String {
    let label = match expr.op() {
        Op::Leaf(operand) => format!("LEAF({})", operand.name),
        Op::Unary(op, _) => format!("UNARY({op})"),
        Op::Binary(op, ..) => format!("BINARY({op})"),
        Op::Elementwise { op, operands } => format!("ELEMENTWISE({op}, n={})", operands.len()),
        Op::Reduce { op, dims, .. } => format!("REDUCE({op}, dims={})", format_dims(dims)),
    };
    format!("[{}] {label} : {}", expr.id, format_dims(expr.free_dims()))
}

fn render(item: &impl TreeItem) -> String {
    let mut buf = Vec::new();
    ptree::write_tree(item, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn render_tree_full(expr: &Arc<Expr>) -> String {
    render(&ExprTreeFull { expr: expr.clone() })
}

pub fn render_tree_compact(expr: &Arc<Expr>) -> String {
    render(&ExprTreeCompact { expr: expr.clone(), visited: Rc::default(), is_backref: RefCell::new(false) })
}
