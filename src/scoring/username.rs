// ============================================
// Username scorer
// ============================================
//
// Decides per platform whether a username "exists" from a string hash of
// `username + platform name` against the platform's popularity. No platform
// is contacted.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::string_hash;
use crate::lookup::FieldMap;

/// Threshold bonus for usernames that look like a real person's handle.
const REALISTIC_BONUS: f64 = 20.0;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 30;

pub const INVALID_USERNAME_MESSAGE: &str = "Invalid username format. Usernames typically contain only letters, numbers, underscores, periods, or hyphens and are 3-30 characters long.";

const NO_PROFILES_NOTE: &str =
    "No social profiles were found. This may indicate the username is unique or not commonly used.";

static VALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"));
static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("valid regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static LONG_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{10,}$").expect("valid regex"));
static COMMON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+[0-9]+$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub name: &'static str,
    /// Profile URL with `{}` where the username goes
    pub url_template: &'static str,
    /// 0.0..=1.0
    pub popularity: f64,
}

impl Platform {
    const fn new(name: &'static str, url_template: &'static str, popularity: f64) -> Self {
        Self {
            name,
            url_template,
            popularity,
        }
    }

    pub fn profile_url(&self, username: &str) -> String {
        self.url_template.replacen("{}", username, 1)
    }

    /// Popularity as a percentage threshold.
    fn threshold(&self) -> f64 {
        self.popularity * 100.0
    }
}

pub const PLATFORMS: &[Platform] = &[
    Platform::new("Facebook", "https://www.facebook.com/{}", 0.9),
    Platform::new("Twitter/X", "https://twitter.com/{}", 0.85),
    Platform::new("Instagram", "https://www.instagram.com/{}", 0.88),
    Platform::new("LinkedIn", "https://www.linkedin.com/in/{}", 0.82),
    Platform::new("GitHub", "https://www.github.com/{}", 0.75),
    Platform::new("Pinterest", "https://www.pinterest.com/{}", 0.65),
    Platform::new("TikTok", "https://www.tiktok.com/@{}", 0.87),
    Platform::new("Reddit", "https://www.reddit.com/user/{}", 0.78),
    Platform::new("Medium", "https://medium.com/@{}", 0.55),
    Platform::new("YouTube", "https://www.youtube.com/{}", 0.85),
    Platform::new("Twitch", "https://www.twitch.tv/{}", 0.7),
    Platform::new("Dribbble", "https://dribbble.com/{}", 0.45),
    Platform::new("Behance", "https://www.behance.net/{}", 0.48),
    Platform::new("Snapchat", "https://www.snapchat.com/add/{}", 0.75),
    Platform::new("Quora", "https://www.quora.com/profile/{}", 0.5),
    Platform::new("Spotify", "https://open.spotify.com/user/{}", 0.65),
    Platform::new("SoundCloud", "https://soundcloud.com/{}", 0.5),
    Platform::new("Flickr", "https://www.flickr.com/people/{}", 0.35),
    Platform::new("Vimeo", "https://vimeo.com/{}", 0.45),
    Platform::new("Dev.to", "https://dev.to/{}", 0.4),
    Platform::new("Tumblr", "https://www.tumblr.com/{}", 0.55),
    Platform::new("Patreon", "https://www.patreon.com/{}", 0.4),
    Platform::new("Etsy", "https://www.etsy.com/shop/{}", 0.5),
    Platform::new("Goodreads", "https://www.goodreads.com/user/show/{}", 0.35),
    Platform::new("Steam", "https://steamcommunity.com/id/{}", 0.65),
    Platform::new("DeviantArt", "https://www.deviantart.com/{}", 0.4),
    Platform::new("Last.fm", "https://www.last.fm/user/{}", 0.3),
    Platform::new("Meetup", "https://www.meetup.com/members/{}", 0.25),
    Platform::new("Ko-fi", "https://ko-fi.com/{}", 0.2),
    Platform::new("Fiverr", "https://www.fiverr.com/{}", 0.4),
    Platform::new("Upwork", "https://www.upwork.com/freelancers/{}", 0.35),
    Platform::new("Product Hunt", "https://www.producthunt.com/@{}", 0.3),
    Platform::new("Udemy", "https://www.udemy.com/user/{}", 0.3),
    Platform::new("Kaggle", "https://www.kaggle.com/{}", 0.25),
    Platform::new("Strava", "https://www.strava.com/athletes/{}", 0.3),
    Platform::new("Bandcamp", "https://www.bandcamp.com/{}", 0.25),
    Platform::new("500px", "https://500px.com/{}", 0.2),
    Platform::new("Unsplash", "https://unsplash.com/@{}", 0.3),
    Platform::new("Mixcloud", "https://www.mixcloud.com/{}", 0.25),
    Platform::new("CodePen", "https://www.codepen.io/{}", 0.35),
    Platform::new("Hashnode", "https://hashnode.com/@{}", 0.25),
    Platform::new("Gumroad", "https://www.gumroad.com/{}", 0.2),
    Platform::new("Instructables", "https://www.instructables.com/member/{}", 0.15),
    Platform::new("Ravelry", "https://www.ravelry.com/people/{}", 0.15),
    Platform::new("HackerRank", "https://www.hackerrank.com/{}", 0.3),
    Platform::new("LeetCode", "https://leetcode.com/{}", 0.3),
    Platform::new("npm", "https://www.npmjs.com/~{}", 0.25),
    Platform::new("Mastodon", "https://mastodon.social/@{}", 0.35),
    Platform::new("freeCodeCamp", "https://www.freecodecamp.org/{}", 0.25),
    Platform::new("Bitbucket", "https://www.bitbucket.org/{}", 0.3),
];

pub fn has_valid_chars(username: &str) -> bool {
    VALID_CHARS.is_match(username)
}

pub fn has_reasonable_length(username: &str) -> bool {
    (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.chars().count())
}

/// Letters followed by digits, e.g. `john42`.
pub fn has_common_pattern(username: &str) -> bool {
    COMMON_PATTERN.is_match(username)
}

/// Contains letters plus digits or an underscore, and is not a long run of
/// random-looking alphanumerics.
pub fn is_realistic(username: &str) -> bool {
    let has_pattern =
        LETTERS.is_match(username) && (DIGITS.is_match(username) || username.contains('_'));
    has_pattern && !LONG_ALNUM_RUN.is_match(username)
}

/// Reject malformed usernames before any scoring happens.
pub fn validate(username: &str) -> Result<(), &'static str> {
    if has_valid_chars(username) && has_reasonable_length(username) {
        Ok(())
    } else {
        Err(INVALID_USERNAME_MESSAGE)
    }
}

pub fn exists_on_platform(username: &str, platform: &Platform) -> bool {
    let hash = string_hash(&format!("{}{}", username, platform.name));
    let bonus = if is_realistic(username) {
        REALISTIC_BONUS
    } else {
        0.0
    };
    f64::from(hash % 100) < platform.threshold() + bonus
}

/// Platforms (in table order) the username is reported on.
pub fn matching_platforms(username: &str) -> Vec<&'static Platform> {
    PLATFORMS
        .iter()
        .filter(|p| exists_on_platform(username, p))
        .collect()
}

/// Full report: platform → profile URL, then summary fields.
pub fn search(username: &str, now: DateTime<Utc>) -> Result<FieldMap, &'static str> {
    validate(username)?;

    let found = matching_platforms(username);
    let mut data = FieldMap::new();
    for platform in &found {
        data.insert(platform.name, platform.profile_url(username));
    }
    data.insert("Username", username);
    data.insert("Search Date", now.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    data.insert("Profiles Found", found.len());
    if found.is_empty() {
        data.insert("Note", NO_PROFILES_NOTE);
    }
    Ok(data)
}
