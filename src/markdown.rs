use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};

/// A display block of the summary. Inline styling is flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { depth: usize, marker: String, text: String },
    Quote(String),
    Code(String),
    Rule,
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn take_text(buffer: &mut String) -> String {
    let text = buffer.trim().to_string();
    buffer.clear();
    text
}

fn flush_item(blocks: &mut Vec<Block>, item: &mut Option<(usize, String)>, buffer: &mut String) {
    let text = take_text(buffer);
    if let Some((depth, marker)) = item.take() {
        if !text.is_empty() {
            blocks.push(Block::ListItem { depth, marker, text });
        }
    }
}

pub fn summary_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut buffer = String::new();
    // One entry per open list; `Some(n)` is the next number of an ordered list.
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut item: Option<(usize, String)> = None;
    let mut quote_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::List(start)) => {
                flush_item(&mut blocks, &mut item, &mut buffer);
                lists.push(start);
            }
            Event::End(Tag::List(_)) => {
                lists.pop();
            }
            Event::Start(Tag::Item) => {
                let marker = match lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{}.", next);
                        *next += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                item = Some((lists.len(), marker));
            }
            Event::End(Tag::Item) => flush_item(&mut blocks, &mut item, &mut buffer),
            Event::End(Tag::Heading(level, _, _)) => {
                let text = take_text(&mut buffer);
                blocks.push(Block::Heading {
                    level: heading_level(level),
                    text,
                });
            }
            Event::End(Tag::Paragraph) => {
                if item.is_some() {
                    buffer.push(' ');
                    continue;
                }
                let text = take_text(&mut buffer);
                if text.is_empty() {
                    continue;
                }
                if quote_depth > 0 {
                    blocks.push(Block::Quote(text));
                } else {
                    blocks.push(Block::Paragraph(text));
                }
            }
            Event::Start(Tag::BlockQuote) => quote_depth += 1,
            Event::End(Tag::BlockQuote) => quote_depth = quote_depth.saturating_sub(1),
            Event::Start(Tag::CodeBlock(_)) => flush_item(&mut blocks, &mut item, &mut buffer),
            Event::End(Tag::CodeBlock(_)) => {
                let code = buffer.trim_end_matches('\n').to_string();
                buffer.clear();
                blocks.push(Block::Code(code));
            }
            Event::Text(text) | Event::Code(text) => buffer.push_str(&text),
            Event::SoftBreak => buffer.push(' '),
            Event::HardBreak => buffer.push('\n'),
            Event::Rule => blocks.push(Block::Rule),
            _ => {}
        }
    }

    flush_item(&mut blocks, &mut item, &mut buffer);
    blocks
}
