//! Login and logout.
//!
//! After the credentials are sent, the host walks through a series of
//! interstitial screens (duplicate-session prompt, rate-limit notice, failed
//! attempt history, "press any key") before reaching the main menu. The
//! screen is polled and each recognised interstitial is answered until the
//! main-menu marker appears on the status line.

use crate::charset::{Charset, LOGIN_BANNER};
use crate::error::{BotError, Result};
use crate::keys::ENTER;
use crate::link::Link;
use crate::screen::ScreenBuffer;
use crate::session::SessionEvent;
use tracing::{debug, info, warn};

const BAD_CREDENTIALS: [&str; 2] = ["密碼不對或無此帳號", "請重新輸入"];
const TRY_LATER: &str = "請稍後再試";
const GUESSING_WARNING: &str = "亂踹密碼會留下記錄喔";
const GUESSING_WARNING_ROW: usize = 13;

const DUPLICATE_SESSION: &str = "您想刪除其他重複登入的連線嗎";
const TOO_FREQUENT: &str = "請勿頻繁登入以免造成系統過度負荷";
const CLEAR_ERROR_HISTORY: &str = "您要刪除以上錯誤嘗試的記錄嗎";
const PRESS_ANY_KEY: &str = "按任意鍵繼續";
const MAIN_MENU: &str = "我是";

/// Why the host refused a login outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    BadCredentials,
    TryLater,
    /// Too many wrong passwords; the host is recording attempts.
    Flagged,
}

/// What the login screen is currently asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSignal {
    InProgress,
    DuplicateSession,
    TooFrequent,
    ClearErrorHistory,
    PressAnyKey,
    /// A yes/no question no other signal matched.
    UnknownPrompt,
    Completed,
    Unrecognized,
}

impl ScreenSignal {
    /// Keystrokes answering this screen.
    fn answer(self, kick: bool) -> Option<String> {
        match self {
            Self::DuplicateSession if kick => Some(format!("y{ENTER}")),
            Self::DuplicateSession => Some(format!("n{ENTER}")),
            Self::TooFrequent | Self::PressAnyKey => Some(ENTER.to_string()),
            Self::ClearErrorHistory | Self::UnknownPrompt => Some(format!("y{ENTER}")),
            Self::InProgress | Self::Completed | Self::Unrecognized => None,
        }
    }

    /// Prompts answered once while they stay on screen; the host can take
    /// longer than a poll interval to redraw after the answer.
    fn answered_once(self) -> bool {
        matches!(
            self,
            Self::DuplicateSession | Self::TooFrequent | Self::ClearErrorHistory
        )
    }
}

/// Failure markers that can show up right after the credentials are sent.
pub fn early_failure(screen: &ScreenBuffer) -> Option<LoginFailure> {
    let prompt = screen.from_bottom(2);
    if BAD_CREDENTIALS.iter().any(|marker| prompt.contains(marker)) {
        Some(LoginFailure::BadCredentials)
    } else if screen.status().contains(TRY_LATER) {
        Some(LoginFailure::TryLater)
    } else if screen.row(GUESSING_WARNING_ROW).contains(GUESSING_WARNING) {
        Some(LoginFailure::Flagged)
    } else {
        None
    }
}

pub fn classify(screen: &ScreenBuffer) -> ScreenSignal {
    let prompt = screen.from_bottom(1);
    let status = screen.status();
    if prompt.contains(LOGIN_BANNER) {
        ScreenSignal::InProgress
    } else if prompt.contains(DUPLICATE_SESSION) {
        ScreenSignal::DuplicateSession
    } else if status.contains(TOO_FREQUENT) {
        ScreenSignal::TooFrequent
    } else if status.contains(CLEAR_ERROR_HISTORY) {
        ScreenSignal::ClearErrorHistory
    } else if status.contains(PRESS_ANY_KEY) {
        ScreenSignal::PressAnyKey
    } else if format!("{}{}", prompt.text(), status.text())
        .to_lowercase()
        .contains("y/n")
    {
        ScreenSignal::UnknownPrompt
    } else if status.contains(MAIN_MENU) {
        ScreenSignal::Completed
    } else {
        ScreenSignal::Unrecognized
    }
}

/// Log in with `username` and `password`.
///
/// `kick` answers the duplicate-session prompt: `true` closes the other
/// connections, `false` keeps them.
///
/// Resolves `Ok(false)` if the host rejects the credentials; a
/// [`SessionEvent::LoginFailed`] is broadcast with the reason. Resolves
/// `Ok(true)` immediately if already logged in.
///
/// # Errors
///
/// [`BotError::LoginTimedOut`] if the main menu never appears, and any
/// transport error from the underlying sends.
pub async fn login<L: Link + ?Sized>(
    link: &mut L,
    username: &str,
    password: &str,
    kick: bool,
) -> Result<bool> {
    if link.state().logged_in {
        debug!("already logged in");
        return Ok(true);
    }

    let mut account = username.replace(',', "");
    // A trailing comma asks the host for UTF-8 output.
    if link.config().charset == Charset::Utf8 {
        account.push(',');
    }
    info!(username = %account.trim_end_matches(','), "logging in");
    link.send(&format!("{account}{ENTER}{password}{ENTER}")).await?;

    if let Some(failure) = early_failure(link.screen()) {
        warn!(?failure, "login rejected");
        link.notify(SessionEvent::LoginFailed(failure));
        return Ok(false);
    }

    await_main_menu(link, kick).await?;
    link.confirm_login(account.trim_end_matches(','));
    link.notify(SessionEvent::LoginSucceeded);
    Ok(true)
}

async fn await_main_menu<L: Link + ?Sized>(link: &mut L, kick: bool) -> Result<()> {
    let interval = link.config().login_poll_interval();
    let max_polls = link.config().login.max_polls;
    let mut answered: Option<ScreenSignal> = None;

    for _ in 0..max_polls {
        link.pause(interval).await?;
        let signal = classify(link.screen());
        match signal {
            ScreenSignal::Completed => return Ok(()),
            ScreenSignal::UnknownPrompt => {
                warn!(screen = %link.screen(), "unknown login prompt, answering yes");
            }
            ScreenSignal::Unrecognized => {
                debug!(screen = %link.screen(), "unrecognized login screen");
            }
            _ => {}
        }

        // Only another answered-once prompt resets the tag; redraws in
        // between do not.
        if signal.answered_once() {
            if answered == Some(signal) {
                continue;
            }
            answered = Some(signal);
        }
        if let Some(keys) = signal.answer(kick) {
            debug!(?signal, "answering login prompt");
            link.send(&keys).await?;
        }
    }
    Err(BotError::LoginTimedOut(max_polls))
}

/// Log out through the main menu. Resolves `false` if not logged in.
pub async fn logout<L: Link + ?Sized>(link: &mut L) -> Result<bool> {
    if !link.state().logged_in {
        return Ok(false);
    }
    link.send(&format!("G{ENTER}Y{ENTER}")).await?;
    link.confirm_logout();
    link.send(ENTER).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLink, screen};

    fn main_menu() -> ScreenBuffer {
        screen(&[(0, "【主功能表】"), (23, "[10/16 星期五 12:00] 我是guest")])
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&screen(&[(22, LOGIN_BANNER)])), ScreenSignal::InProgress);
        assert_eq!(
            classify(&screen(&[(22, "您想刪除其他重複登入的連線嗎？[Y/n]")])),
            ScreenSignal::DuplicateSession
        );
        assert_eq!(
            classify(&screen(&[(23, " 請勿頻繁登入以免造成系統過度負荷")])),
            ScreenSignal::TooFrequent
        );
        assert_eq!(
            classify(&screen(&[(23, "您要刪除以上錯誤嘗試的記錄嗎? [y/N]")])),
            ScreenSignal::ClearErrorHistory
        );
        assert_eq!(
            classify(&screen(&[(23, "       ▏ 按任意鍵繼續 ▕")])),
            ScreenSignal::PressAnyKey
        );
        assert_eq!(
            classify(&screen(&[(22, "要更新嗎？"), (23, "[Y/N]")])),
            ScreenSignal::UnknownPrompt
        );
        assert_eq!(classify(&main_menu()), ScreenSignal::Completed);
        assert_eq!(classify(&screen(&[])), ScreenSignal::Unrecognized);
    }

    #[test]
    fn test_early_failure() {
        assert_eq!(
            early_failure(&screen(&[(21, "密碼不對或無此帳號。請檢查大小寫")])),
            Some(LoginFailure::BadCredentials)
        );
        assert_eq!(
            early_failure(&screen(&[(23, "請稍後再試")])),
            Some(LoginFailure::TryLater)
        );
        assert_eq!(
            early_failure(&screen(&[(13, "    亂踹密碼會留下記錄喔")])),
            Some(LoginFailure::Flagged)
        );
        assert_eq!(early_failure(&screen(&[(22, LOGIN_BANNER)])), None);
    }

    #[tokio::test]
    async fn test_bad_password() {
        let mut link = ScriptedLink::new().reply(screen(&[(21, "密碼不對或無此帳號")]));
        assert!(!login(&mut link, "guest", "wrong", false).await.unwrap());
        assert_eq!(link.sent, vec!["guest\rwrong\r"]);
        assert_eq!(link.pauses, 0);
        assert!(!link.state.logged_in);
        assert_eq!(
            link.events,
            vec![SessionEvent::LoginFailed(LoginFailure::BadCredentials)]
        );
    }

    #[tokio::test]
    async fn test_duplicate_session_answered_once() {
        let duplicate = screen(&[(22, "您想刪除其他重複登入的連線嗎？[Y/n]")]);
        let mut link = ScriptedLink::new()
            .reply(screen(&[(22, LOGIN_BANNER)]))
            .tick(screen(&[(22, LOGIN_BANNER)]))
            .tick(duplicate.clone())
            .tick(duplicate)
            .tick(main_menu());
        link.replies.push_back(None); // the answer itself draws nothing

        assert!(login(&mut link, "guest", "pw", true).await.unwrap());
        assert_eq!(link.sent, vec!["guest\rpw\r", "y\r"]);
        assert!(link.state.logged_in);
        assert_eq!(link.state.username.as_deref(), Some("guest"));
        assert_eq!(link.boardname(), Some(""));
        assert!(link.events.contains(&SessionEvent::LoginSucceeded));
        assert!(
            link.events
                .iter()
                .any(|e| matches!(e, SessionEvent::StateChanged(s) if s.logged_in))
        );
    }

    #[tokio::test]
    async fn test_keep_other_sessions() {
        let mut link = ScriptedLink::new()
            .reply(screen(&[]))
            .tick(screen(&[(22, "您想刪除其他重複登入的連線嗎？[Y/n]")]))
            .tick(main_menu());
        assert!(login(&mut link, "guest", "pw", false).await.unwrap());
        assert_eq!(link.sent, vec!["guest\rpw\r", "n\r"]);
    }

    #[tokio::test]
    async fn test_duplicate_session_not_answered_again_after_redraw() {
        let duplicate = screen(&[(22, "您想刪除其他重複登入的連線嗎？[Y/n]")]);
        let mut link = ScriptedLink::new()
            .reply(screen(&[(22, LOGIN_BANNER)]))
            .tick(duplicate.clone())
            .tick(screen(&[]))
            .tick(screen(&[(22, LOGIN_BANNER)]))
            .tick(duplicate)
            .tick(main_menu());
        link.replies.push_back(None);

        assert!(login(&mut link, "guest", "pw", true).await.unwrap());
        assert_eq!(link.sent, vec!["guest\rpw\r", "y\r"]);
    }

    #[tokio::test]
    async fn test_press_any_key_answered_each_time() {
        let any_key = screen(&[(23, "按任意鍵繼續")]);
        let mut link = ScriptedLink::new()
            .reply(screen(&[]))
            .tick(any_key.clone())
            .tick(any_key)
            .tick(main_menu());
        assert!(login(&mut link, "guest", "pw", false).await.unwrap());
        assert_eq!(link.sent, vec!["guest\rpw\r", "\r", "\r"]);
    }

    #[tokio::test]
    async fn test_utf8_account_suffix() {
        let mut link = ScriptedLink::new().reply(screen(&[])).tick(main_menu());
        link.config.charset = Charset::Utf8;
        assert!(login(&mut link, "gu,est", "pw", false).await.unwrap());
        assert_eq!(link.sent, vec!["guest,\rpw\r"]);
        assert_eq!(link.state.username.as_deref(), Some("guest"));
    }

    #[tokio::test]
    async fn test_login_times_out() {
        let mut link = ScriptedLink::new().reply(screen(&[(22, LOGIN_BANNER)]));
        link.config.login.max_polls = 3;
        let result = login(&mut link, "guest", "pw", false).await;
        assert!(matches!(result, Err(BotError::LoginTimedOut(3))));
        assert_eq!(link.pauses, 3);
        assert!(!link.state.logged_in);
    }

    #[tokio::test]
    async fn test_already_logged_in() {
        let mut link = ScriptedLink::logged_in("guest");
        assert!(login(&mut link, "guest", "pw", false).await.unwrap());
        assert!(link.sent.is_empty());
    }

    #[tokio::test]
    async fn test_logout() {
        let mut link = ScriptedLink::logged_in("guest");
        assert!(logout(&mut link).await.unwrap());
        assert_eq!(link.sent, vec!["G\rY\r", "\r"]);
        assert!(!link.state.logged_in);
        assert!(!logout(&mut link).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_requires_connection() {
        let mut link = ScriptedLink::new();
        link.state.connected = false;
        assert!(matches!(
            login(&mut link, "guest", "pw", false).await,
            Err(BotError::NotConnected)
        ));
    }
}
