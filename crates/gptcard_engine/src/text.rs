use ego_tree::NodeRef;
use scraper::node::Node;

/// Renders the text a user sees inside `node`, roughly like `innerText`:
/// block elements and `<br>` break lines, whitespace runs collapse.
pub(crate) fn render_inner_text(node: NodeRef<'_, Node>) -> String {
    let mut ctx = TextContext::default();
    for child in node.children() {
        visit_node(child, &mut ctx);
    }
    ctx.into_output()
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(element) => match element.name() {
            "br" => ctx.force_newline(),
            "script" | "style" | "noscript" | "template" => {}
            name if is_block(name) => {
                ctx.ensure_newline();
                visit_children(node, ctx);
                ctx.ensure_newline();
            }
            _ => visit_children(node, ctx),
        },
        Node::Comment(_) | Node::ProcessingInstruction(_) | Node::Doctype(_) => {}
        _ => visit_children(node, ctx),
    }
}

fn visit_children(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    for child in node.children() {
        visit_node(child, ctx);
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "blockquote"
            | "pre"
            | "ul"
            | "ol"
            | "li"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "table"
            | "tr"
            | "hr"
    )
}

#[derive(Default)]
struct TextContext {
    builder: String,
    last_char: Option<char>,
}

impl TextContext {
    fn into_output(self) -> String {
        self.builder.trim().to_string()
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char == Some(' ') || self.last_char == Some('\n') {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.builder.is_empty() {
            return;
        }
        self.force_newline();
    }

    fn force_newline(&mut self) {
        if self.last_char == Some(' ') {
            self.builder.pop();
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}
