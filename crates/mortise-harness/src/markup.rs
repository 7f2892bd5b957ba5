#![forbid(unsafe_code)]

//! Markup serialization of a settled instance tree.

use std::fmt::Write;

use crate::instance::Instance;

pub(crate) fn render_to_string(instances: &[Instance]) -> String {
    let mut out = String::new();
    write_instances(&mut out, instances);
    out
}

fn write_instances(out: &mut String, instances: &[Instance]) {
    for instance in instances {
        match instance {
            Instance::Text(text) => escape_into(out, text),
            Instance::Element { tag, children } => {
                let _ = write!(out, "<{tag}>");
                write_instances(out, children);
                let _ = write!(out, "</{tag}>");
            }
            Instance::Empty | Instance::Fill { .. } => {}
            Instance::Provider { children, .. } => write_instances(out, children),
            Instance::Slot { mounted, .. } => write_instances(out, mounted),
            Instance::Counter { count } => {
                let _ = write!(out, "<button>{count}</button>");
            }
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
