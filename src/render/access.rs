//! Access evaluation for document rendering
//!
//! Public documents render for anyone. Restricted documents require a
//! verified identity; by the time this runs, token verification has already
//! collapsed every failure mode (absent, malformed, expired, bad signature)
//! into `None`, so the decision is fail-closed.

use crate::auth::Identity;
use crate::catalog::{Document, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

pub fn evaluate(document: &Document, identity: Option<&Identity>) -> Access {
    match document.visibility {
        Visibility::Public => Access::Allow,
        Visibility::Restricted => {
            if identity.is_some() {
                Access::Allow
            } else {
                Access::Deny
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(visibility: Visibility) -> Document {
        Document {
            id: "d1".to_string(),
            book_id: None,
            visibility,
            asset: Some("d1.pdf".to_string()),
        }
    }

    fn identity() -> Identity {
        Identity {
            subject: "user-1".to_string(),
            role: None,
            email: None,
        }
    }

    #[test]
    fn public_allows_anonymous() {
        assert_eq!(evaluate(&doc(Visibility::Public), None), Access::Allow);
    }

    #[test]
    fn public_allows_identified() {
        let id = identity();
        assert_eq!(evaluate(&doc(Visibility::Public), Some(&id)), Access::Allow);
    }

    #[test]
    fn restricted_denies_anonymous() {
        assert_eq!(evaluate(&doc(Visibility::Restricted), None), Access::Deny);
    }

    #[test]
    fn restricted_allows_identified() {
        let id = identity();
        assert_eq!(
            evaluate(&doc(Visibility::Restricted), Some(&id)),
            Access::Allow
        );
    }
}
