//! Reward page reader.
//!
//! The daily event page marks an unclaimed reward with an element carrying the
//! `reward-star` class and `data-id` / `data-period` attributes. The number of
//! days claimed so far is the first number inside the first `<h5>`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::claim::RewardSnapshot;
use crate::error::ClaimError;

const REWARD_ID_ATTR: &str = "data-id";
const REWARD_PERIOD_ATTR: &str = "data-period";

const STEP: &str = "reward page";

static REWARD_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse(".reward-star").ok());
static COUNTER_SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("h5").ok());
static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

/// Parse the reward page into a snapshot.
///
/// A missing reward marker is not an error (nothing left to claim); a missing
/// progress indicator is, since the page is then not the one we expect.
pub fn read_reward_page(html: &str) -> Result<RewardSnapshot, ClaimError> {
    let (Some(reward_selector), Some(counter_selector)) =
        (REWARD_SELECTOR.as_ref(), COUNTER_SELECTOR.as_ref())
    else {
        return Err(ClaimError::Unexpected {
            step: STEP,
            reason: "page selectors failed to compile".to_string(),
        });
    };

    let document = Html::parse_document(html);

    let days_claimed_so_far = document
        .select(counter_selector)
        .next()
        .and_then(|h5| first_number(&h5.text().collect::<String>()))
        .ok_or_else(|| ClaimError::Unexpected {
            step: STEP,
            reason: "no claimed-days counter on the page".to_string(),
        })?;

    let snapshot = match document.select(reward_selector).next() {
        Some(reward) => RewardSnapshot {
            claimable: true,
            item_id: reward.value().attr(REWARD_ID_ATTR).map(str::to_string),
            period_id: reward.value().attr(REWARD_PERIOD_ATTR).map(str::to_string),
            days_claimed_so_far,
        },
        None => RewardSnapshot {
            claimable: false,
            item_id: None,
            period_id: None,
            days_claimed_so_far,
        },
    };
    Ok(snapshot)
}

fn first_number(text: &str) -> Option<u32> {
    DIGITS.as_ref()?.find(text)?.as_str().parse().ok()
}
