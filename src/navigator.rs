use crate::browser::PageSession;
use crate::config::RetryPolicy;
use crate::error::ScrapeError;

/// Load `url`, wait for `anchor` to become clickable and click it.
///
/// Every attempt starts with a fresh load of `url`, so a failed load, wait or
/// click is retried from the directory root. Returns the number of attempts
/// used; after `policy.max_attempts` failures the anchor is reported as
/// unreachable.
pub fn navigate<S: PageSession>(
    session: &mut S,
    url: &str,
    anchor: &str,
    policy: &RetryPolicy,
) -> Result<u32, ScrapeError> {
    let mut attempt = 1;
    loop {
        let outcome = session
            .load(url)
            .and_then(|_| session.wait_clickable(anchor, policy.timeout()))
            .and_then(|_| session.click(anchor));

        match outcome {
            Ok(()) => {
                log::debug!("Clicked {} on attempt {}", anchor, attempt);
                return Ok(attempt);
            }
            Err(e) if attempt >= policy.max_attempts => {
                log::error!("Unsuccessful request for {}, now stopping: {}", anchor, e);
                return Err(ScrapeError::NavigationError {
                    anchor: anchor.to_string(),
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                attempt += 1;
                log::warn!(
                    "Unsuccessful request for {} ({}), trying again. Attempt: {}",
                    anchor,
                    e,
                    attempt
                );
            }
        }
    }
}
