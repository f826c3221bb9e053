//! Node and edge labels for the graph renderer.
//!
//! Dispatch is an exhaustive match on the op variant with an explicit
//! fallback arm, so an op kind this schema does not know (including the
//! terminal node of every definition) still gets a label.

use std::fmt;

use crate::digest::Digest;
use crate::pb::{self, file_action, op};

/// Graphviz node shape for each op kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Ellipse,
    Box,
    Box3d,
    InvTriangle,
    DoubleCircle,
    Note,
    PlainText,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Ellipse => "ellipse",
            Shape::Box => "box",
            Shape::Box3d => "box3d",
            Shape::InvTriangle => "invtriangle",
            Shape::DoubleCircle => "doublecircle",
            Shape::Note => "note",
            Shape::PlainText => "plaintext",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabel {
    pub label: String,
    pub shape: Shape,
}

impl NodeLabel {
    fn new(label: impl Into<String>, shape: Shape) -> Self {
        Self {
            label: label.into(),
            shape,
        }
    }
}

/// Display label and shape of an op. Never fails.
pub fn resolve_label(digest: &Digest, op: &pb::Op) -> NodeLabel {
    match &op.op {
        Some(op::Op::Source(source)) => NodeLabel::new(source.identifier.as_str(), Shape::Ellipse),
        Some(op::Op::Exec(exec)) => {
            let args = exec
                .meta
                .as_ref()
                .map(|meta| meta.args.join(" "))
                .unwrap_or_default();
            NodeLabel::new(args, Shape::Box)
        }
        Some(op::Op::Build(_)) => NodeLabel::new("build", Shape::Box3d),
        Some(op::Op::Merge(_)) => NodeLabel::new("merge", Shape::InvTriangle),
        Some(op::Op::Diff(_)) => NodeLabel::new("diff", Shape::DoubleCircle),
        Some(op::Op::File(file)) => {
            let names: Vec<String> = file.actions.iter().map(file_action_label).collect();
            NodeLabel::new(names.join(","), Shape::Note)
        }
        None => NodeLabel::new(digest.as_str(), Shape::PlainText),
    }
}

fn file_action_label(action: &pb::FileAction) -> String {
    match &action.action {
        Some(file_action::Action::Copy(copy)) => {
            format!("copy{{src={}, dest={}}}", copy.src, copy.dest)
        }
        Some(file_action::Action::Mkfile(mkfile)) => format!("mkfile{{path={}}}", mkfile.path),
        Some(file_action::Action::Mkdir(mkdir)) => format!("mkdir{{path={}}}", mkdir.path),
        Some(file_action::Action::Rm(rm)) => format!("rm{{path={}}}", rm.path),
        Some(file_action::Action::Symlink(link)) => {
            format!("symlink{{oldpath={}, newpath={}}}", link.oldpath, link.newpath)
        }
        None => String::new(),
    }
}

/// Label of the edge feeding input `input_index` into `op`.
///
/// Only exec ops label their edges: the destination of the last mount bound
/// to that input, unless it is the root mount. Every other kind yields "".
pub fn edge_label(op: &pb::Op, input_index: usize) -> &str {
    let Some(op::Op::Exec(exec)) = &op.op else {
        return "";
    };

    let mut label = "";
    for mount in &exec.mounts {
        if usize::try_from(mount.input).ok() == Some(input_index) && mount.dest != "/" {
            label = mount.dest.as_str();
        }
    }
    label
}
