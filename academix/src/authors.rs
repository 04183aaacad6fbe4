use std::collections::HashMap;

use crate::error::Result;
use crate::models::AuthorSummary;
use crate::store::Store;

/// Author summaries keyed by user id. Ids without a stored user resolve to
/// [`AuthorSummary::unknown`].
pub(crate) struct AuthorDirectory {
    authors: HashMap<String, AuthorSummary>,
}

impl AuthorDirectory {
    pub(crate) async fn load<'a, I>(store: &dyn Store, ids: I, with_email: bool) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut wanted: Vec<String> = Vec::new();
        for id in ids {
            if !wanted.iter().any(|w| w == id) {
                wanted.push(id.to_string());
            }
        }

        let authors = store
            .find_users(&wanted)
            .await?
            .iter()
            .map(|user| (user.id.clone(), AuthorSummary::from_user(user, with_email)))
            .collect();
        Ok(Self { authors })
    }

    pub(crate) fn get(&self, id: &str) -> AuthorSummary {
        self.authors
            .get(id)
            .cloned()
            .unwrap_or_else(|| AuthorSummary::unknown(id))
    }
}
