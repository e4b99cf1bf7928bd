// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Markdown to HTML, with mention expansion and sanitization.

use marktone_mentions::{find_mentions, Mention};
use pulldown_cmark::{
    CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream,
};

use crate::sanitize::{self, is_safe_url};
use crate::{DirectoryEntity, MentionResolver};

/// One step of the render stream: either a Markdown event or trusted markup
/// produced by mention expansion, which sanitization must keep.
pub(crate) enum Segment<'a> {
    Markdown(Event<'a>),
    Mention(String),
}

/// Renders Markdown source to the HTML pushed to the host.
///
/// GitHub-flavoured extensions (tables, strikethrough, task lists) are on,
/// single line breaks become `<br />` and headings get no generated ids.
#[derive(Clone, Debug)]
pub struct Renderer {
    options: Options,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    /// Render `markdown` against the entities currently in `resolver`.
    ///
    /// Unresolved mentions fall back to `@code`. The output depends only on
    /// the text and the cache contents.
    pub fn render(&self, markdown: &str, resolver: &MentionResolver) -> String {
        let mut expander = MentionExpander::new(resolver);
        let events =
            TextMergeStream::new(Parser::new_ext(markdown, self.options))
                .map(soft_break_to_line_break)
                .flat_map(|event| expander.expand(event))
                .map(sanitize::sanitize);

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events);
        html
    }
}

fn soft_break_to_line_break(event: Event<'_>) -> Event<'_> {
    match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    }
}

struct MentionExpander<'r> {
    resolver: &'r MentionResolver,
    // Depth of code blocks, links and images; tokens there stay literal.
    verbatim_depth: usize,
}

impl<'r> MentionExpander<'r> {
    fn new(resolver: &'r MentionResolver) -> Self {
        Self {
            resolver,
            verbatim_depth: 0,
        }
    }

    fn expand<'a>(&mut self, event: Event<'a>) -> Vec<Segment<'a>> {
        match event {
            Event::Start(
                Tag::CodeBlock(_) | Tag::Link { .. } | Tag::Image { .. },
            ) => {
                self.verbatim_depth += 1;
            }
            Event::End(TagEnd::CodeBlock | TagEnd::Link | TagEnd::Image) => {
                self.verbatim_depth = self.verbatim_depth.saturating_sub(1);
            }
            Event::Text(text) if self.verbatim_depth == 0 => {
                return self.expand_text(text);
            }
            _ => {}
        }
        vec![Segment::Markdown(event)]
    }

    fn expand_text<'a>(&self, text: CowStr<'a>) -> Vec<Segment<'a>> {
        let found: Vec<_> = find_mentions(&text).collect();
        if found.is_empty() {
            return vec![Segment::Markdown(Event::Text(text))];
        }

        let mut segments = Vec::with_capacity(found.len() * 2 + 1);
        let mut last = 0;
        for mention_match in found {
            if mention_match.range.start > last {
                segments.push(plain_text(&text[last..mention_match.range.start]));
            }
            segments.push(self.mention_segment(&mention_match.mention));
            last = mention_match.range.end;
        }
        if last < text.len() {
            segments.push(plain_text(&text[last..]));
        }
        segments
    }

    fn mention_segment<'a>(&self, mention: &Mention) -> Segment<'a> {
        match self.resolver.entity(&mention.code) {
            Some(entity) => Segment::Mention(mention_html(&entity)),
            None => plain_text(&format!("@{}", mention.code)),
        }
    }
}

fn plain_text<'a>(text: &str) -> Segment<'a> {
    Segment::Markdown(Event::Text(CowStr::from(text.to_owned())))
}

/// The display element for a resolved mention, shaped like the host's own
/// mention links so its submission handler recognises them.
fn mention_html(entity: &DirectoryEntity) -> String {
    let mut html = format!(
        "<a class=\"ocean-ui-plugin-mention-{} ocean-ui-plugin-linkbubble-no\" data-mention-id=\"{}\" tabindex=\"-1\">",
        entity.kind.to_string().to_lowercase(),
        entity.id,
    );
    if !entity.avatar.is_empty() && is_safe_url(&entity.avatar) {
        html.push_str(&format!(
            "<img class=\"mention-avatar\" src=\"{}\" alt=\"\" />",
            html_escape::encode_double_quoted_attribute(&entity.avatar)
        ));
    }
    html.push('@');
    html.push_str(&html_escape::encode_text(&entity.name));
    html.push_str("</a>");
    html
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::Renderer;
    use crate::tests::testutils_client::entity;
    use crate::{EntityKind, MentionResolver};

    fn render(markdown: &str) -> String {
        Renderer::new().render(markdown, &MentionResolver::new())
    }

    fn resolver_with_alice() -> MentionResolver {
        let resolver = MentionResolver::new();
        resolver.insert(entity(EntityKind::User, 3, "alice", "Alice A."));
        resolver
    }

    #[test]
    fn renders_paragraphs() {
        assert_eq!(render("hello"), "<p>hello</p>\n");
    }

    #[test]
    fn single_line_breaks_become_br() {
        assert_eq!(render("one\ntwo"), "<p>one<br />\ntwo</p>\n");
    }

    #[test]
    fn headings_have_no_ids() {
        assert_eq!(render("# Title"), "<h1>Title</h1>\n");
    }

    #[test]
    fn tables_and_strikethrough_are_enabled() {
        let html = render(indoc! {"
            | a | b |
            |---|---|
            | 1 | ~~2~~ |
        "});
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<td>1</td>"), "{html}");
        assert!(html.contains("<del>2</del>"), "{html}");
    }

    #[test]
    fn resolved_mention_shows_display_name() {
        let html = Renderer::new()
            .render("hi @[user:alice]!", &resolver_with_alice());
        assert_eq!(
            html,
            "<p>hi <a class=\"ocean-ui-plugin-mention-user ocean-ui-plugin-linkbubble-no\" data-mention-id=\"3\" tabindex=\"-1\"><img class=\"mention-avatar\" src=\"https://example.com/avatar/3.png\" alt=\"\" />@Alice A.</a>!</p>\n"
        );
        assert!(!html.contains("alice"));
    }

    #[test]
    fn unresolved_mention_falls_back_to_code() {
        assert_eq!(render("hi @[user:bob]"), "<p>hi @bob</p>\n");
    }

    #[test]
    fn mentions_in_code_stay_literal() {
        let resolver = resolver_with_alice();
        let html = Renderer::new().render(
            indoc! {"
                ```
                ping @[user:alice]
                ```
                `@[user:alice]`
            "},
            &resolver,
        );
        assert!(!html.contains("Alice A."), "{html}");
        assert_eq!(html.matches("@[user:alice]").count(), 2, "{html}");
    }

    #[test]
    fn display_names_are_escaped() {
        let resolver = MentionResolver::new();
        resolver.insert(entity(EntityKind::Group, 5, "ops", "<b>Ops</b>"));
        let html = Renderer::new().render("@[group:ops]", &resolver);
        assert!(html.contains("@&lt;b&gt;Ops&lt;/b&gt;</a>"), "{html}");
        assert!(html.contains("ocean-ui-plugin-mention-group"), "{html}");
    }

    #[test]
    fn upload_references_render_as_images() {
        assert_eq!(
            render("![cat.png](tmp:abc123 \"=250\")"),
            "<p><img src=\"tmp:abc123\" alt=\"cat.png\" title=\"=250\" /></p>\n"
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let resolver = resolver_with_alice();
        let renderer = Renderer::new();
        let source = "**hey** @[user:alice] and @[org:sales]\n\n- [x] done";
        assert_eq!(
            renderer.render(source, &resolver),
            renderer.render(source, &resolver)
        );
    }
}
