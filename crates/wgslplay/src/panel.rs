use std::fmt::Write as _;

use linker::LinkedShader;

/// Renders one tab per module, in link order, followed by the linked program.
pub fn render(shader: &LinkedShader) -> String {
    let mut out = String::new();
    for name in &shader.order {
        let source = shader.modules.get(name).map(String::as_str).unwrap_or_default();
        push_tab(&mut out, name, source);
    }
    push_tab(&mut out, "linked", &shader.linked);
    out
}

fn push_tab(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "==== {title} ====");
    out.push_str(body.trim_end());
    out.push_str("\n\n");
}
