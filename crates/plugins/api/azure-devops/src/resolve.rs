//! Wiki selection among the wikis a project owns.

use azdo_core::{Error, Result, Wiki, WikiMatch};

/// Wiki name fragment preferred by [`WikiMatch::Documentation`].
const DOCUMENTATION: &str = "documentation";

/// Pick one wiki for `project`.
///
/// Falls back to the first wiki in service order when nothing matches the
/// policy, so the result is deterministic for a given list.
///
/// - [`WikiMatch::ProjectName`]: first wiki whose name contains `project`
///   verbatim.
/// - [`WikiMatch::Documentation`]: first wiki whose lower-cased name contains
///   the lower-cased, space-stripped project name or `documentation`.
pub fn select_wiki(wikis: &[Wiki], project: &str, policy: WikiMatch) -> Result<Wiki> {
    let first = wikis
        .first()
        .ok_or_else(|| Error::NotFound("No wikis found for this project".to_string()))?;

    let matched = match policy {
        WikiMatch::ProjectName => wikis.iter().find(|w| w.name.contains(project)),
        WikiMatch::Documentation => {
            let needle: String = project
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            wikis.iter().find(|w| {
                let name = w.name.to_lowercase();
                name.contains(&needle) || name.contains(DOCUMENTATION)
            })
        }
    };

    Ok(matched.unwrap_or(first).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki(id: &str, name: &str) -> Wiki {
        Wiki {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_empty_list_is_not_found() {
        let err = select_wiki(&[], "Fabrikam", WikiMatch::ProjectName).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_project_name_match() {
        let wikis = vec![wiki("1", "Team.wiki"), wiki("2", "Fabrikam Fiber.wiki")];
        let chosen = select_wiki(&wikis, "Fabrikam Fiber", WikiMatch::ProjectName).unwrap();
        assert_eq!(chosen.id, "2");
    }

    #[test]
    fn test_project_name_is_case_sensitive() {
        let wikis = vec![wiki("1", "Team.wiki"), wiki("2", "fabrikam.wiki")];
        let chosen = select_wiki(&wikis, "Fabrikam", WikiMatch::ProjectName).unwrap();
        assert_eq!(chosen.id, "1");
    }

    #[test]
    fn test_documentation_match_normalizes_name() {
        let wikis = vec![wiki("1", "Team.wiki"), wiki("2", "fabrikamfiber.wiki")];
        let chosen = select_wiki(&wikis, "Fabrikam Fiber", WikiMatch::Documentation).unwrap();
        assert_eq!(chosen.id, "2");
    }

    #[test]
    fn test_documentation_keyword() {
        let wikis = vec![wiki("1", "Team.wiki"), wiki("2", "Product Documentation")];
        let chosen = select_wiki(&wikis, "Other", WikiMatch::Documentation).unwrap();
        assert_eq!(chosen.id, "2");
    }

    #[test]
    fn test_fallback_to_first_and_deterministic() {
        let wikis = vec![wiki("a", "Alpha"), wiki("b", "Beta")];
        for _ in 0..3 {
            let chosen = select_wiki(&wikis, "Gamma", WikiMatch::ProjectName).unwrap();
            assert_eq!(chosen.id, "a");
        }
        let chosen = select_wiki(&wikis, "Gamma", WikiMatch::Documentation).unwrap();
        assert_eq!(chosen.id, "a");
    }

    #[test]
    fn test_first_match_wins() {
        let wikis = vec![
            wiki("1", "Fabrikam.wiki"),
            wiki("2", "Fabrikam Documentation"),
        ];
        assert_eq!(
            select_wiki(&wikis, "Fabrikam", WikiMatch::ProjectName).unwrap().id,
            "1"
        );
        assert_eq!(
            select_wiki(&wikis, "Fabrikam", WikiMatch::Documentation).unwrap().id,
            "1"
        );
    }
}
