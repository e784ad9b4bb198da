//! Wiki pages.
//!
//! Write, list and search resolve the wiki whose name contains the project
//! name; page reads prefer a documentation wiki. Both fall back to the first
//! wiki of the project.

use azdo_core::{PageWrite, RecursionLevel, Wiki, WikiMatch, WikiPage, WikiProvider};
use serde::Deserialize;
use serde_json::Value;

use super::{failure, params, ToolHandler};
use crate::protocol::ToolCallResult;

/// Characters of context kept on each side of a search hit.
const SNIPPET_CONTEXT: usize = 100;

#[derive(Debug, Deserialize)]
struct ManagePageParams {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GetPageParams {
    path: String,
    #[serde(default)]
    include_children: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ListPagesParams {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    recursive: bool,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    path: Option<String>,
}

impl ToolHandler {
    async fn wiki(&self, policy: WikiMatch) -> Result<Wiki, ToolCallResult> {
        self.provider
            .resolve_wiki(policy)
            .await
            .map_err(|e| failure("Failed to resolve wiki", e))
    }

    pub(super) async fn manage_wiki_page(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: ManagePageParams = params!("manage_wiki_page", arguments);

        let wiki = match self.wiki(WikiMatch::ProjectName).await {
            Ok(wiki) => wiki,
            Err(result) => return result,
        };

        match self
            .provider
            .upsert_page(&wiki, &params.path, &params.content)
            .await
        {
            Ok(write) => {
                let verb = match write {
                    PageWrite::Created => "created",
                    PageWrite::Updated => "updated",
                };
                ToolCallResult::text(format!("Successfully {} wiki page: {}", verb, params.path))
            }
            Err(e) => failure("Failed to manage wiki page", e),
        }
    }

    pub(super) async fn get_wiki_page(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: GetPageParams = params!("get_wiki_page", arguments);

        let wiki = match self.wiki(WikiMatch::Documentation).await {
            Ok(wiki) => wiki,
            Err(result) => return result,
        };

        let recursion = if params.include_children {
            RecursionLevel::OneLevel
        } else {
            RecursionLevel::None
        };

        let page = match self
            .provider
            .get_page(&wiki, &params.path, recursion, true)
            .await
        {
            Ok(page) => page,
            Err(e) => return failure("Failed to get wiki page", e),
        };

        let mut text = format!(
            "=== {} ===\n\n{}",
            params.path,
            page.content.as_deref().unwrap_or_default()
        );

        if params.include_children && !page.sub_pages.is_empty() {
            text.push_str("\n\nSub-pages:\n");
            for child in &page.sub_pages {
                text.push_str(&format!(
                    "\n=== {} ===\n{}\n",
                    child.path,
                    child.content.as_deref().unwrap_or_default()
                ));
            }
        }

        ToolCallResult::text(text)
    }

    pub(super) async fn list_wiki_pages(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: ListPagesParams = params!("list_wiki_pages", arguments);

        let wiki = match self.wiki(WikiMatch::ProjectName).await {
            Ok(wiki) => wiki,
            Err(result) => return result,
        };

        let path = params
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let recursion = if params.recursive {
            RecursionLevel::Full
        } else {
            RecursionLevel::OneLevel
        };

        let tree = match self
            .provider
            .get_page(&wiki, path.unwrap_or("/"), recursion, false)
            .await
        {
            Ok(tree) => tree,
            Err(e) => return failure("Failed to list wiki pages", e),
        };

        let location = path.map(|p| format!(" in {}", p)).unwrap_or_default();
        let pages: Vec<&WikiPage> = tree.flatten().into_iter().skip(1).collect();
        if pages.is_empty() {
            return ToolCallResult::text(format!("No wiki pages found{}", location));
        }

        let mut text = format!("Wiki pages{}:\n\n", location);
        for page in pages {
            let marker = if page.is_parent_page { "📁 " } else { "📄 " };
            text.push_str(&format!("{}{}\n", marker, page.path));
        }

        ToolCallResult::text(text)
    }

    pub(super) async fn search_wiki(&self, arguments: Option<Value>) -> ToolCallResult {
        let params: SearchParams = params!("search_wiki", arguments);

        let query = params.query.trim();
        if query.is_empty() {
            return ToolCallResult::error("Search query must not be empty".to_string());
        }

        let wiki = match self.wiki(WikiMatch::ProjectName).await {
            Ok(wiki) => wiki,
            Err(result) => return result,
        };

        let root = params
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("/");

        let tree = match self
            .provider
            .get_page(&wiki, root, RecursionLevel::Full, true)
            .await
        {
            Ok(tree) => tree,
            Err(e) => return failure("Failed to search wiki", e),
        };

        let matches: Vec<String> = tree
            .flatten()
            .into_iter()
            .filter_map(|page| {
                let hit = page
                    .content
                    .as_deref()
                    .and_then(|content| snippet(content, query))
                    .or_else(|| snippet(&page.path, query))?;
                Some(format!("Page: {}\nMatch: {}\n---\n", page.path, hit))
            })
            .collect();

        if matches.is_empty() {
            return ToolCallResult::text(format!("No matches found for '{}'", query));
        }

        ToolCallResult::text(format!(
            "Found {} matches:\n\n{}",
            matches.len(),
            matches.join("\n")
        ))
    }

    pub(super) async fn get_available_wikis(&self) -> ToolCallResult {
        let wikis = match self.provider.list_wikis().await {
            Ok(wikis) => wikis,
            Err(e) => return failure("Failed to get wikis", e),
        };

        let project = self.provider.project();
        if wikis.is_empty() {
            return ToolCallResult::text(format!("No wikis found for project {}", project));
        }

        let mut text = format!("Found {} wikis for project {}:\n\n", wikis.len(), project);
        for (i, wiki) in wikis.iter().enumerate() {
            text.push_str(&format!(
                "{}. Wiki Name: {}\n   Wiki ID: {}\n\n",
                i + 1,
                wiki.name,
                wiki.id
            ));
        }

        ToolCallResult::text(text)
    }
}

/// Case-insensitive hit of `query` in `text` with surrounding context.
fn snippet(text: &str, query: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold).collect();
    let needle: Vec<char> = query.chars().map(fold).collect();
    if needle.is_empty() {
        return None;
    }

    let index = folded
        .windows(needle.len())
        .position(|window| window == needle.as_slice())?;

    let start = index.saturating_sub(SNIPPET_CONTEXT);
    let end = (index + needle.len() + SNIPPET_CONTEXT).min(chars.len());

    let mut snippet: String = chars[start..end].iter().collect();
    if start > 0 {
        snippet.insert_str(0, "...");
    }
    if end < chars.len() {
        snippet.push_str("...");
    }
    Some(snippet)
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
