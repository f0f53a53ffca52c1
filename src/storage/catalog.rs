use std::collections::HashSet;

use tracing::info;

use crate::error::AppError;
use crate::storage::ObjectStore;

/// Public URLs of every object stored under `prefix`, following continuation
/// tokens until the listing is exhausted. Keys repeated across pages are kept once.
pub async fn list_videos(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>, AppError> {
    let prefix = format!("{}/", prefix.trim_end_matches('/'));

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut continuation_token = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_page(&prefix, continuation_token.clone()).await?;
        pages += 1;

        for key in page.keys {
            if seen.insert(key.clone()) {
                urls.push(store.public_url(&key));
            }
        }

        match page.next_continuation_token {
            Some(token) if continuation_token.as_deref() == Some(token.as_str()) => {
                return Err(AppError::Storage(format!(
                    "Listing under {prefix} returned the same continuation token twice"
                )));
            }
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    info!("Listed {} videos under {} in {} pages", urls.len(), prefix, pages);
    Ok(urls)
}
