use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";
const SESSION_COOKIES: &[&str] = &["SID", "__Secure-1PSID", "__Secure-3PSID", "LOGIN_INFO"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieState {
    Missing,
    Empty,
    Expired,
    NoSession,
    Ok,
}

/// Summary of a Netscape-format cookie file.
#[derive(Clone, Debug, Serialize)]
pub struct CookieStatus {
    pub path: String,
    pub exists: bool,
    pub state: CookieState,
    pub cookie_count: usize,
    pub youtube_cookies: usize,
    pub expired: usize,
    pub has_session: bool,
    pub message: String,
}

struct CookieLine<'a> {
    domain: &'a str,
    expires: i64,
    name: &'a str,
}

impl CookieStatus {
    pub fn inspect(path: &Path) -> Self {
        let display = path.display().to_string();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                let message = if path.exists() {
                    format!("Cookie file {display} could not be read: {e}")
                } else {
                    format!("No cookie file at {display}. Requests run unauthenticated and may hit bot checks")
                };
                return Self::without_cookies(display, path.exists(), CookieState::Missing, message);
            }
        };

        Self::from_contents(display, &contents, Utc::now().timestamp())
    }

    fn from_contents(path: String, contents: &str, now: i64) -> Self {
        let entries: Vec<&str> = contents.lines().filter_map(entry_line).collect();
        let cookies: Vec<CookieLine> = entries.iter().filter_map(|line| parse_fields(line)).collect();
        if entries.is_empty() {
            let message = format!("Cookie file {path} contains no cookies. Export cookies again");
            return Self::without_cookies(path, true, CookieState::Empty, message);
        }

        let youtube: Vec<&CookieLine> = cookies
            .iter()
            .filter(|c| c.domain.trim_start_matches('.').ends_with("youtube.com"))
            .collect();
        // expiry 0 marks a session cookie
        let expired = youtube.iter().filter(|c| c.expires != 0 && c.expires < now).count();
        let live_session = youtube
            .iter()
            .any(|c| SESSION_COOKIES.contains(&c.name) && (c.expires == 0 || c.expires >= now));
        let has_session = youtube.iter().any(|c| SESSION_COOKIES.contains(&c.name));

        let (state, message) = if youtube.is_empty() || !has_session {
            (
                CookieState::NoSession,
                "Cookie file has no YouTube login session. Log into YouTube and export cookies again".to_string(),
            )
        } else if !live_session {
            (
                CookieState::Expired,
                "YouTube session cookies have expired. Regenerate the cookie file".to_string(),
            )
        } else {
            (CookieState::Ok, "Cookie file looks valid".to_string())
        };

        Self {
            path,
            exists: true,
            state,
            cookie_count: entries.len(),
            youtube_cookies: youtube.len(),
            expired,
            has_session,
            message,
        }
    }

    fn without_cookies(path: String, exists: bool, state: CookieState, message: String) -> Self {
        Self {
            path,
            exists,
            state,
            cookie_count: 0,
            youtube_cookies: 0,
            expired: 0,
            has_session: false,
            message,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.state == CookieState::Ok
    }
}

/// A cookie entry with any `#HttpOnly_` prefix removed. Comments and blank
/// lines are not entries.
fn entry_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.strip_prefix(HTTP_ONLY_PREFIX) {
        Some(rest) => Some(rest),
        None if line.starts_with('#') || line.trim().is_empty() => None,
        None => Some(line),
    }
}

/// Entries with fewer than seven tab-separated fields still count as
/// cookies but carry no domain, expiry or name.
fn parse_fields(line: &str) -> Option<CookieLine<'_>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 7 {
        return None;
    }
    Some(CookieLine {
        domain: fields[0],
        expires: fields[4].trim().parse().unwrap_or(0),
        name: fields[5],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NOW: i64 = 1_760_000_000;

    fn line(domain: &str, expires: i64, name: &str) -> String {
        format!("{domain}\tTRUE\t/\tTRUE\t{expires}\t{name}\tvalue\n")
    }

    #[test]
    fn valid_session_is_ok() {
        let contents = format!(
            "# Netscape HTTP Cookie File\n\n{}{}{}",
            line(".youtube.com", NOW + 1000, "SID"),
            format!("{HTTP_ONLY_PREFIX}{}", line(".youtube.com", NOW + 1000, "__Secure-3PSID")),
            line(".google.com", NOW - 10, "NID"),
        );
        let status = CookieStatus::from_contents("cookies.txt".into(), &contents, NOW);
        assert_eq!(status.state, CookieState::Ok);
        assert_eq!(status.cookie_count, 3);
        assert_eq!(status.youtube_cookies, 2);
        assert_eq!(status.expired, 0);
        assert!(status.is_usable());
    }

    #[test]
    fn expired_session_is_reported() {
        let contents = format!(
            "{}{}",
            line(".youtube.com", NOW - 1, "SID"),
            line(".youtube.com", NOW + 50, "PREF"),
        );
        let status = CookieStatus::from_contents("cookies.txt".into(), &contents, NOW);
        assert_eq!(status.state, CookieState::Expired);
        assert_eq!(status.expired, 1);
        assert!(status.has_session);
    }

    #[test]
    fn session_cookie_without_expiry_counts_as_live() {
        let contents = line("www.youtube.com", 0, "LOGIN_INFO");
        let status = CookieStatus::from_contents("cookies.txt".into(), &contents, NOW);
        assert_eq!(status.state, CookieState::Ok);
    }

    #[test]
    fn no_youtube_login_is_reported() {
        let contents = line(".youtube.com", NOW + 10, "VISITOR_INFO1_LIVE");
        let status = CookieStatus::from_contents("cookies.txt".into(), &contents, NOW);
        assert_eq!(status.state, CookieState::NoSession);
    }

    #[test]
    fn comments_only_is_empty() {
        let status =
            CookieStatus::from_contents("cookies.txt".into(), "# Netscape HTTP Cookie File\n# comment\n", NOW);
        assert_eq!(status.state, CookieState::Empty);
        assert_eq!(status.cookie_count, 0);
    }

    #[test]
    fn short_entries_count_but_skip_field_checks() {
        let contents = format!(
            "# Netscape HTTP Cookie File\n{}.youtube.com\tTRUE\t/\n{HTTP_ONLY_PREFIX}broken\n",
            line(".youtube.com", NOW + 1000, "SID"),
        );
        let status = CookieStatus::from_contents("cookies.txt".into(), &contents, NOW);
        assert_eq!(status.cookie_count, 3);
        assert_eq!(status.youtube_cookies, 1);
        assert_eq!(status.state, CookieState::Ok);

        let status = CookieStatus::from_contents("cookies.txt".into(), "garbage line\n", NOW);
        assert_eq!(status.cookie_count, 1);
        assert_eq!(status.state, CookieState::NoSession);
    }

    #[test]
    fn inspects_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CookieStatus::inspect(&dir.path().join("cookies.txt"));
        assert_eq!(missing.state, CookieState::Missing);
        assert!(!missing.exists);

        let path = dir.path().join("present.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(line(".youtube.com", 0, "SID").as_bytes()).unwrap();
        let present = CookieStatus::inspect(&path);
        assert!(present.exists);
        assert_eq!(present.state, CookieState::Ok);
    }
}
