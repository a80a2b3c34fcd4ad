use crate::{AccountResponse, AccountsPage, Endpoint, RpcError};
use reqwest::blocking::Client;

/// Default page size for indexer account searches
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Fetch every account opted into an application, following indexer pagination
///
/// The indexer returns a `next-token` while more results remain; pages are
/// requested until it is absent or a page comes back empty.
pub fn get_accounts_opted_into_app_paged(
    client: &Client,
    indexer: &Endpoint,
    app_id: u64,
    page_size: usize,
) -> Result<Vec<AccountResponse>, RpcError> {
    let mut accounts = Vec::new();
    let mut next: Option<String> = None;

    loop {
        let mut request = indexer
            .request(client)
            .with_path("/v2/accounts")
            .with_query("application-id", app_id)
            .with_query("limit", page_size);
        if let Some(token) = &next {
            request = request.with_query("next", token);
        }

        let page: AccountsPage = request.get_json()?;
        let received = page.accounts.len();
        accounts.extend(page.accounts);

        match page.next_token {
            Some(token) if received > 0 => next = Some(token),
            _ => break,
        }
    }

    log::debug!("Indexer returned {} accounts opted into app {}", accounts.len(), app_id);
    Ok(accounts)
}

/// Fetch opted-in accounts with the default page size
pub fn get_accounts_opted_into_app(
    client: &Client,
    indexer: &Endpoint,
    app_id: u64,
) -> Result<Vec<AccountResponse>, RpcError> {
    get_accounts_opted_into_app_paged(client, indexer, app_id, DEFAULT_PAGE_SIZE)
}
