//! Indented text rendering of a grouping tree.

use opaef_ledger::{AmountField, GroupNode};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_LABEL_WIDTH: usize = 48;
const INDENT: usize = 2;

/// Truncate to `width` display columns, ending in ".." when cut.
fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

fn pad_right(s: &str, width: usize) -> String {
    let s = truncate_display(s, width);
    let pad = width.saturating_sub(UnicodeWidthStr::width(s.as_str()));
    format!("{s}{}", " ".repeat(pad))
}

fn label_width(node: &GroupNode, depth: usize) -> usize {
    let own = depth * INDENT + UnicodeWidthStr::width(node.label.as_str());
    node.children
        .iter()
        .map(|c| label_width(c, depth + 1))
        .fold(own, usize::max)
}

/// Tree as aligned text: one line per node, amounts per ledger column.
/// `with_records` also lists the records under each leaf.
pub(crate) fn render_tree(root: &GroupNode, with_records: bool) -> String {
    let width = label_width(root, 0).clamp(8, MAX_LABEL_WIDTH);
    let mut out = String::new();

    out.push_str(&pad_right("", width));
    out.push_str(&format!(" {:>7}", "records"));
    for field in AmountField::ALL {
        out.push_str(&format!(" {:>14}", field.label()));
    }
    out.push('\n');

    render_node(root, 0, width, with_records, &mut out);
    out
}

fn render_node(node: &GroupNode, depth: usize, width: usize, with_records: bool, out: &mut String) {
    let indent = " ".repeat(depth * INDENT);
    out.push_str(&pad_right(&format!("{indent}{}", node.label), width));
    out.push_str(&format!(" {:>7}", node.record_count));
    for field in AmountField::ALL {
        out.push_str(&format!(" {:>14}", node.amounts.get(field).to_string()));
    }
    out.push('\n');

    for child in &node.children {
        render_node(child, depth + 1, width, with_records, out);
    }

    if with_records {
        let indent = " ".repeat((depth + 1) * INDENT);
        for record in &node.records {
            out.push_str(&format!(
                "{indent}- {} {} ({}) {}\n",
                record.fiscal_year,
                record.collection_key,
                record.concept,
                record.total()
            ));
        }
    }
}
