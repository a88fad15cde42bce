use std::{fmt::Display, ops::Deref, str::FromStr, sync::Arc};

use super::error::SessionError;

/// Apps the dashboard offers for monitoring.
pub const APP_CATALOG: [&str; 5] = ["Instagram", "YouTube", "Browser", "WhatsApp", "TikTok"];

/// Allowed nudge intervals in minutes.
pub const NUDGE_INTERVAL_OPTIONS: [u32; 5] = [1, 2, 3, 4, 5];

/// Identifier of a monitored app. Any non-blank name is accepted here; the catalog restriction is
/// applied by the front end through [AppName::from_catalog].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppName(Arc<str>);

impl AppName {
    pub fn new_opt(value: &str) -> Option<AppName> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(AppName(value.into()))
        }
    }

    /// Case-insensitive lookup in [APP_CATALOG], returning the canonical spelling.
    pub fn from_catalog(value: &str) -> Result<AppName, SessionError> {
        let value = value.trim();
        APP_CATALOG
            .iter()
            .find(|v| v.eq_ignore_ascii_case(value))
            .map(|v| AppName((*v).into()))
            .ok_or_else(|| SessionError::UnknownApp(value.to_string()))
    }

    pub fn catalog() -> impl Iterator<Item = AppName> {
        APP_CATALOG.iter().map(|v| AppName((*v).into()))
    }

    pub fn as_arc(&self) -> Arc<str> {
        self.0.clone()
    }
}

impl Deref for AppName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for AppName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppName {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppName::from_catalog(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeInterval(u32);

impl NudgeInterval {
    pub fn new_opt(minutes: u32) -> Option<NudgeInterval> {
        NUDGE_INTERVAL_OPTIONS
            .contains(&minutes)
            .then_some(NudgeInterval(minutes))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn seconds(&self) -> u32 {
        self.0 * 60
    }
}

impl Default for NudgeInterval {
    fn default() -> Self {
        NudgeInterval(NUDGE_INTERVAL_OPTIONS[0])
    }
}

impl Display for NudgeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl FromStr for NudgeInterval {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "3m" is accepted as well as "3"
        let trimmed = s.trim().trim_end_matches('m');
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(NudgeInterval::new_opt)
            .ok_or_else(|| SessionError::InvalidInterval(s.to_string()))
    }
}

/// Apps to watch and the per-use time limit. A copy is frozen into the session on start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    monitored_apps: Vec<AppName>,
    nudge_interval: NudgeInterval,
}

impl SessionConfig {
    /// Duplicate apps are dropped, selection order is kept.
    pub fn new(apps: impl IntoIterator<Item = AppName>, nudge_interval: NudgeInterval) -> Self {
        let mut monitored_apps = Vec::<AppName>::new();
        for app in apps {
            if !monitored_apps.contains(&app) {
                monitored_apps.push(app);
            }
        }
        Self {
            monitored_apps,
            nudge_interval,
        }
    }

    pub fn monitored_apps(&self) -> &[AppName] {
        &self.monitored_apps
    }

    pub fn nudge_interval(&self) -> NudgeInterval {
        self.nudge_interval
    }

    pub fn is_monitored(&self, app: &AppName) -> bool {
        self.monitored_apps.contains(app)
    }

    pub fn is_empty(&self) -> bool {
        self.monitored_apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppName, NudgeInterval, SessionConfig};
    use crate::session::error::SessionError;

    #[test]
    fn catalog_lookup_is_case_insensitive() {
        assert_eq!(&*AppName::from_catalog("youtube").unwrap(), "YouTube");
        assert_eq!(&*"  TIKTOK ".parse::<AppName>().unwrap(), "TikTok");
        assert_eq!(
            AppName::from_catalog("Solitaire"),
            Err(SessionError::UnknownApp("Solitaire".into()))
        );
    }

    #[test]
    fn blank_app_names_are_rejected() {
        assert!(AppName::new_opt("   ").is_none());
        assert_eq!(&*AppName::new_opt(" Games ").unwrap(), "Games");
    }

    #[test]
    fn interval_only_accepts_enumerated_options() {
        assert_eq!("3".parse::<NudgeInterval>().unwrap().minutes(), 3);
        assert_eq!("5m".parse::<NudgeInterval>().unwrap().seconds(), 300);
        assert!("0".parse::<NudgeInterval>().is_err());
        assert!("6".parse::<NudgeInterval>().is_err());
        assert!("soon".parse::<NudgeInterval>().is_err());
        assert_eq!(NudgeInterval::default().minutes(), 1);
    }

    #[test]
    fn config_deduplicates_apps_in_order() {
        let apps = ["Browser", "Instagram", "Browser"]
            .into_iter()
            .map(|v| AppName::new_opt(v).unwrap());
        let config = SessionConfig::new(apps, NudgeInterval::default());
        let names = config
            .monitored_apps()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Browser", "Instagram"]);
        assert!(config.is_monitored(&AppName::new_opt("Instagram").unwrap()));
        assert!(!config.is_monitored(&AppName::new_opt("TikTok").unwrap()));
    }
}
