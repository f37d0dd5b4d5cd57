//! Output renderers for generated transition systems: a plain-text listing,
//! Graphviz DOT, a dot2tex-ready DOT variant, and JSON.

use std::fmt::Write;

use crate::explore::Lts;
use crate::transition::{Configuration, Label, Symbol, SymbolKind};

/// One configuration on a single line, the way the transition tests and the
/// interactive prompt show it.
pub fn pretty_configuration(conf: &Configuration) -> String {
    format!("{} -> {} ¦- {}", conf.label, conf.registers, conf.term)
}

/// The plain-text listing of an LTS: the root line followed by one line per
/// transition. States that hit the register bound carry a `+` suffix.
pub fn pretty_lts(lts: &Lts) -> String {
    let Some(root) = lts.states.get(&0) else {
        return String::new();
    };

    let suffix = |id: usize| {
        if lts.reg_size_reached.contains(&id) {
            "+"
        } else {
            ""
        }
    };

    let mut out = format!(
        "s0{} = {} |- {}",
        suffix(0),
        root.registers,
        root.term
    );
    for transition in &lts.transitions {
        let Some(target) = lts.states.get(&transition.target) else {
            continue;
        };
        let _ = write!(
            out,
            "\ns{}{}  {}  s{}{} = {} |- {}",
            transition.source,
            suffix(transition.source),
            transition.label,
            transition.target,
            suffix(transition.target),
            target.registers,
            target.term
        );
    }
    out
}

/// The Graphviz DOT rendering. The root state is drawn with a double
/// periphery, register-bounded states with a triple one. With
/// `show_state_ids` the nodes are labelled `s0`, `s1`, ... instead of full
/// configurations.
pub fn graphviz(lts: &Lts, show_state_ids: bool, layout: &str) -> String {
    let mut out = String::from("digraph {");
    if !layout.is_empty() {
        let _ = write!(out, "\n    {layout}\n");
    }
    out.push('\n');

    for (&id, conf) in &lts.states {
        let config = if show_state_ids {
            format!("s{id}")
        } else {
            format!("{} ⊢\n{}", conf.registers, conf.term)
        };
        let mut attrs = String::new();
        if id == 0 {
            attrs.push_str("peripheries=2,");
        }
        if lts.reg_size_reached.contains(&id) {
            attrs.push_str("peripheries=3,");
        }
        let _ = writeln!(out, "    s{id} [{attrs}label=\"{config}\"]");
    }

    out.push('\n');
    for transition in &lts.transitions {
        let _ = writeln!(
            out,
            "    s{} -> s{} [label=\"{}\"]",
            transition.source,
            transition.target,
            graph_label(&transition.label)
        );
    }
    out.push_str("}\n");
    out
}

fn graph_label(label: &Label) -> String {
    if label.is_tau() {
        return "τ".into();
    }
    format!(
        "{}{}",
        graph_symbol(&label.channel),
        graph_symbol(&label.value)
    )
}

fn graph_symbol(symbol: &Symbol) -> String {
    match symbol.kind {
        SymbolKind::Input => format!("{} ", symbol.index),
        SymbolKind::Output => format!("{}' ", symbol.index),
        SymbolKind::FreshInput => format!("{}●", symbol.index),
        SymbolKind::FreshOutput => format!("{}⊛", symbol.index),
        SymbolKind::Tau => "τ".into(),
        SymbolKind::Known => symbol.index.to_string(),
    }
}

/// The DOT rendering with LaTeX labels, for postprocessing with dot2tex.
pub fn graphviz_tex(lts: &Lts, show_state_ids: bool, layout: &str) -> String {
    let mut out = String::from("digraph {");
    if !layout.is_empty() {
        let _ = write!(out, "\n    {layout}\n");
    }
    out.push('\n');
    out.push_str("    d2toptions=\"--format tikz --crop --autosize --nominsize\";\n");
    out.push_str("    d2tdocpreamble=\"\\usepackage{amssymb}\";\n\n");

    for (&id, conf) in &lts.states {
        let config = if show_state_ids {
            format!("s_{{{id}}}")
        } else {
            format!(
                "\\begin{{matrix}} {} \\vdash \\\\ {} \\end{{matrix}}",
                tex_registers(conf),
                tex_term(&conf.term)
            )
        };
        let mut attrs = String::new();
        if id == 0 {
            attrs.push_str("style=\"double\",");
        }
        if lts.reg_size_reached.contains(&id) {
            attrs.push_str("style=\"thick\",");
        }
        let _ = writeln!(out, "    s{id} [{attrs}texlbl=\"${config}$\"]");
    }

    out.push('\n');
    for transition in &lts.transitions {
        let _ = writeln!(
            out,
            "    s{} -> s{} [label=\"\",texlbl=\"${}$\"]",
            transition.source,
            transition.target,
            tex_label(&transition.label)
        );
    }
    out.push_str("}\n");
    out
}

fn tex_registers(conf: &Configuration) -> String {
    let labels = conf.registers.labels();
    let entries: Vec<String> = labels
        .into_iter()
        .filter_map(|label| {
            conf.registers
                .name_at(label)
                .map(|name| format!("({},{})", label, tex_name(name)))
        })
        .collect();
    format!("\\{{{}\\}}", entries.join(","))
}

/// Maps generated names to LaTeX: `#k` becomes `a_{k}`, `&k` becomes
/// `x_{k}`, and marked names drop their `_` prefix.
fn tex_name(name: &str) -> String {
    if let Some(rest) = name.strip_prefix('#') {
        return format!("a_{{{rest}}}");
    }
    if let Some(rest) = name.strip_prefix('&') {
        return format!("x_{{{rest}}}");
    }
    if let Some(rest) = name.strip_prefix('_') {
        return rest.to_string();
    }
    name.to_string()
}

fn tex_term(term: &fresca_dsl::ast::Term) -> String {
    use fresca_dsl::ast::Term;
    match term {
        Term::Nil => "0".into(),
        Term::Output {
            channel,
            value,
            next,
        } => format!(
            "\\bar{{{}}} \\langle {} \\rangle . {}",
            tex_name(&channel.text),
            tex_name(&value.text),
            tex_term(next)
        ),
        Term::Input {
            channel,
            binding,
            next,
        } => format!(
            "{} ( {} ) . {}",
            tex_name(&channel.text),
            tex_name(&binding.text),
            tex_term(next)
        ),
        Term::Match {
            left,
            right,
            negate,
            next,
        } => {
            let op = if *negate { "\\neq" } else { "=" };
            format!(
                "\\lbrack {} {} {} \\rbrack . {}",
                tex_name(&left.text),
                op,
                tex_name(&right.text),
                tex_term(next)
            )
        }
        Term::Restriction { name, next } => {
            format!("\\nu {} . {}", tex_name(&name.text), tex_term(next))
        }
        Term::Sum { left, right } => format!("( {} + {} )", tex_term(left), tex_term(right)),
        Term::Parallel { left, right } => {
            format!("( {} \\mid {} )", tex_term(left), tex_term(right))
        }
        Term::Call { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                let args: Vec<String> = args.iter().map(|a| tex_name(&a.text)).collect();
                format!("{}({})", name, args.join(", "))
            }
        }
        Term::Root(inner) => tex_term(inner),
    }
}

fn tex_label(label: &Label) -> String {
    if label.is_tau() {
        return "\\tau".into();
    }
    format!(
        "{} \\, {}",
        tex_symbol(&label.channel),
        tex_symbol(&label.value)
    )
}

fn tex_symbol(symbol: &Symbol) -> String {
    match symbol.kind {
        SymbolKind::Input | SymbolKind::Known => symbol.index.to_string(),
        SymbolKind::Output => format!("\\bar{{{}}}", symbol.index),
        SymbolKind::FreshInput => format!("{}^{{\\bullet}}", symbol.index),
        SymbolKind::FreshOutput => format!("{}^{{\\circledast}}", symbol.index),
        SymbolKind::Tau => "\\tau".into(),
    }
}

/// The LTS as pretty-printed JSON.
pub fn json(lts: &Lts) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(lts)
}
