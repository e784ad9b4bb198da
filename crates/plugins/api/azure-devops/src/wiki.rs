//! Wiki operations.

use async_trait::async_trait;
use azdo_core::{
    Error, PageWrite, RecursionLevel, Result, Wiki, WikiMatch, WikiPage, WikiProvider,
};
use reqwest::{Method, Url};
use serde_json::json;
use tracing::debug;

use crate::client::{AzureDevOpsClient, PREVIEW_API_VERSION};
use crate::http::Body;
use crate::resolve::select_wiki;
use crate::types::{AzureWiki, AzureWikiPage, ValueList};

impl AzureDevOpsClient {
    fn pages_endpoint(&self, wiki: &Wiki, query: &[(&str, &str)]) -> Result<Url> {
        self.endpoint(&["_apis", "wiki", "wikis", &wiki.id, "pages"], query)
    }
}

#[async_trait]
impl WikiProvider for AzureDevOpsClient {
    async fn list_wikis(&self) -> Result<Vec<Wiki>> {
        let url = self.endpoint(
            &["_apis", "wiki", "wikis"],
            &[("api-version", PREVIEW_API_VERSION)],
        )?;

        let list: ValueList<AzureWiki> = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(list.value.into_iter().map(map_wiki).collect())
    }

    async fn resolve_wiki(&self, policy: WikiMatch) -> Result<Wiki> {
        let wikis = self.list_wikis().await?;
        let wiki = select_wiki(&wikis, &self.project, policy)?;
        debug!(wiki = %wiki.name, policy = ?policy, "Resolved wiki");
        Ok(wiki)
    }

    async fn get_page(
        &self,
        wiki: &Wiki,
        path: &str,
        recursion: RecursionLevel,
        include_content: bool,
    ) -> Result<WikiPage> {
        let path = normalize_path(path);
        let url = self.pages_endpoint(
            wiki,
            &[
                ("path", path.as_str()),
                ("recursionLevel", recursion.as_query()),
                ("includeContent", if include_content { "true" } else { "false" }),
                ("api-version", PREVIEW_API_VERSION),
            ],
        )?;

        let page: AzureWikiPage = self
            .http
            .call(Method::GET, url, Body::Empty, None)
            .await?
            .json()?;

        Ok(map_page(page))
    }

    /// Create or replace a page:
    /// 1. GET the page; a 404 means it does not exist yet
    /// 2. PUT the content, with `If-Match` set to the fetched ETag when the
    ///    page exists
    async fn upsert_page(&self, wiki: &Wiki, path: &str, content: &str) -> Result<PageWrite> {
        let path = normalize_path(path);
        let query = [("path", path.as_str()), ("api-version", PREVIEW_API_VERSION)];

        let existing = self
            .http
            .send(Method::GET, self.pages_endpoint(wiki, &query)?, Body::Empty, None)
            .await?;

        let etag = match existing.status {
            404 => None,
            _ if existing.is_success() => Some(existing.etag.clone().ok_or_else(|| {
                Error::InvalidData(format!("Wiki page {} returned no ETag", path))
            })?),
            _ => return Err(existing.error()),
        };

        debug!(path = %path, exists = etag.is_some(), "Writing wiki page");

        self.http
            .call(
                Method::PUT,
                self.pages_endpoint(wiki, &query)?,
                Body::Json(json!({ "content": content })),
                etag.as_deref(),
            )
            .await?;

        Ok(if etag.is_some() {
            PageWrite::Updated
        } else {
            PageWrite::Created
        })
    }
}

/// Page paths are absolute; an empty path is the wiki root.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn map_wiki(wiki: AzureWiki) -> Wiki {
    Wiki {
        id: wiki.id,
        name: wiki.name,
    }
}

fn map_page(page: AzureWikiPage) -> WikiPage {
    WikiPage {
        path: page.path,
        content: page.content,
        is_parent_page: page.is_parent_page,
        sub_pages: page.sub_pages.into_iter().map(map_page).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("Home"), "/Home");
        assert_eq!(normalize_path("/Home/Setup"), "/Home/Setup");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("  Notes "), "/Notes");
    }

    #[test]
    fn test_map_page_recursive() {
        let page = map_page(AzureWikiPage {
            path: "/".to_string(),
            content: None,
            is_parent_page: true,
            sub_pages: vec![AzureWikiPage {
                path: "/Home".to_string(),
                content: Some("# Home".to_string()),
                ..Default::default()
            }],
        });
        assert_eq!(page.sub_pages.len(), 1);
        assert_eq!(page.sub_pages[0].content.as_deref(), Some("# Home"));
    }

    mod integration {
        use super::*;
        use httpmock::prelude::*;

        const WIKI_ID: &str = "wiki-1";

        fn create_client(server: &MockServer) -> AzureDevOpsClient {
            AzureDevOpsClient::with_base_url(server.base_url(), "Fabrikam", "pat").unwrap()
        }

        fn wiki() -> Wiki {
            Wiki {
                id: WIKI_ID.to_string(),
                name: "Fabrikam.wiki".to_string(),
            }
        }

        fn pages_path() -> String {
            format!("/Fabrikam/_apis/wiki/wikis/{}/pages", WIKI_ID)
        }

        #[tokio::test]
        async fn test_resolve_wiki_by_project_name() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/Fabrikam/_apis/wiki/wikis")
                    .query_param("api-version", "7.2-preview");
                then.status(200).json_body(serde_json::json!({
                    "count": 2,
                    "value": [
                        {"id": "code", "name": "Engineering", "type": "codeWiki"},
                        {"id": "proj", "name": "Fabrikam.wiki", "type": "projectWiki"}
                    ]
                }));
            });

            let client = create_client(&server);
            let wiki = client.resolve_wiki(WikiMatch::ProjectName).await.unwrap();
            assert_eq!(wiki.id, "proj");
        }

        #[tokio::test]
        async fn test_resolve_wiki_none() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/Fabrikam/_apis/wiki/wikis");
                then.status(200).json_body(serde_json::json!({"count": 0, "value": []}));
            });

            let client = create_client(&server);
            let err = client
                .resolve_wiki(WikiMatch::Documentation)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("No wikis found for this project"));
        }

        #[tokio::test]
        async fn test_get_page_with_children() {
            let server = MockServer::start();

            let mock = server.mock(|when, then| {
                when.method(GET)
                    .path(pages_path())
                    .query_param("path", "/Guides")
                    .query_param("recursionLevel", "oneLevel")
                    .query_param("includeContent", "true");
                then.status(200).json_body(serde_json::json!({
                    "path": "/Guides",
                    "content": "Guides index",
                    "isParentPage": true,
                    "subPages": [
                        {"path": "/Guides/Setup", "content": "Install it"}
                    ]
                }));
            });

            let client = create_client(&server);
            let page = client
                .get_page(&wiki(), "Guides", RecursionLevel::OneLevel, true)
                .await
                .unwrap();

            mock.assert();
            assert_eq!(page.content.as_deref(), Some("Guides index"));
            assert_eq!(page.sub_pages[0].path, "/Guides/Setup");
        }

        #[tokio::test]
        async fn test_upsert_creates_missing_page() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path(pages_path());
                then.status(404).json_body(serde_json::json!({
                    "message": "The page '/New' specified in the add operation does not exist."
                }));
            });
            let put = server.mock(|when, then| {
                when.method(PUT)
                    .path(pages_path())
                    .query_param("path", "/New")
                    .json_body(serde_json::json!({"content": "Hello"}));
                then.status(201)
                    .header("ETag", "\"v1\"")
                    .json_body(serde_json::json!({"path": "/New", "content": "Hello"}));
            });

            let client = create_client(&server);
            let write = client.upsert_page(&wiki(), "/New", "Hello").await.unwrap();

            put.assert();
            assert_eq!(write, PageWrite::Created);
        }

        #[tokio::test]
        async fn test_upsert_updates_with_if_match() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path(pages_path());
                then.status(200)
                    .header("ETag", "\"abc123\"")
                    .json_body(serde_json::json!({"path": "/Home", "content": "Old"}));
            });
            let put = server.mock(|when, then| {
                when.method(PUT)
                    .path(pages_path())
                    .header("If-Match", "\"abc123\"")
                    .json_body(serde_json::json!({"content": "New"}));
                then.status(200)
                    .json_body(serde_json::json!({"path": "/Home", "content": "New"}));
            });

            let client = create_client(&server);
            let write = client.upsert_page(&wiki(), "Home", "New").await.unwrap();

            put.assert();
            assert_eq!(write, PageWrite::Updated);
        }

        #[tokio::test]
        async fn test_upsert_lookup_error_propagates() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path(pages_path());
                then.status(401).body("");
            });

            let client = create_client(&server);
            let err = client.upsert_page(&wiki(), "/Home", "x").await.unwrap_err();
            assert_eq!(err.status(), Some(401));
        }
    }
}
