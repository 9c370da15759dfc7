use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A restructuring assumption the user can toggle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioKey {
    /// Subordinate category B ("Sam") coins to zero.
    ZeroSam,
    /// Substantively consolidate Alameda + Ventures into FTX.COM.
    Subcon,
    /// Substantively consolidate the WRS topco into FTX.US.
    SubconUs,
    /// Treat Alameda as a claim recovered at its own asset coverage.
    ClaimAlameda,
    /// Reprice liquid category A tickers from daily closes.
    CategoryAUpdate,
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 5] = [
        ScenarioKey::ZeroSam,
        ScenarioKey::Subcon,
        ScenarioKey::SubconUs,
        ScenarioKey::ClaimAlameda,
        ScenarioKey::CategoryAUpdate,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            ScenarioKey::ZeroSam => "ZERO_SAM",
            ScenarioKey::Subcon => "SUBCON",
            ScenarioKey::SubconUs => "SUBCON_US",
            ScenarioKey::ClaimAlameda => "CLAIM_ALAMEDA",
            ScenarioKey::CategoryAUpdate => "CATEGORY_A_UPDATE",
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scenario toggle '{0}'")]
pub struct UnknownScenarioKey(pub String);

impl FromStr for ScenarioKey {
    type Err = UnknownScenarioKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKey::ALL
            .into_iter()
            .find(|key| key.token() == s)
            .ok_or_else(|| UnknownScenarioKey(s.to_string()))
    }
}

/// How the Alameda silo is treated in the FTX.COM balance sheet.
///
/// SUBCON and CLAIM_ALAMEDA are alternatives for the same silo. When both
/// are toggled on, SUBCON wins and the claim is suppressed; turning SUBCON
/// back off reinstates the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlamedaTreatment {
    #[default]
    None,
    ClaimSelected,
    SubconSelected,
}

impl AlamedaTreatment {
    /// The treatment implied by a final toggle set.
    pub fn resolve(keys: &BTreeSet<ScenarioKey>) -> Self {
        if keys.contains(&ScenarioKey::Subcon) {
            AlamedaTreatment::SubconSelected
        } else if keys.contains(&ScenarioKey::ClaimAlameda) {
            AlamedaTreatment::ClaimSelected
        } else {
            AlamedaTreatment::None
        }
    }

    /// Transition on a toggle event. `claim_on` is whether CLAIM_ALAMEDA
    /// remains toggled on after the event.
    fn next(self, event: ToggleEvent, claim_on: bool) -> Self {
        use AlamedaTreatment::*;
        match (self, event) {
            (_, ToggleEvent::On(ScenarioKey::Subcon)) => SubconSelected,
            (SubconSelected, ToggleEvent::Off(ScenarioKey::Subcon)) if claim_on => ClaimSelected,
            (SubconSelected, ToggleEvent::Off(ScenarioKey::Subcon)) => None,
            (SubconSelected, _) => SubconSelected,
            (_, ToggleEvent::On(ScenarioKey::ClaimAlameda)) => ClaimSelected,
            (ClaimSelected, ToggleEvent::Off(ScenarioKey::ClaimAlameda)) => None,
            (state, _) => state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEvent {
    On(ScenarioKey),
    Off(ScenarioKey),
}

/// The set of toggled-on scenario keys.
///
/// Only the final set matters to the composer; the Alameda treatment is
/// tracked through explicit transitions and always agrees with
/// [`AlamedaTreatment::resolve`] on the current set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<ScenarioKey>,
    treatment: AlamedaTreatment,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: ToggleEvent) {
        match event {
            ToggleEvent::On(key) => {
                self.keys.insert(key);
            }
            ToggleEvent::Off(key) => {
                self.keys.remove(&key);
            }
        }
        let claim_on = self.keys.contains(&ScenarioKey::ClaimAlameda);
        self.treatment = self.treatment.next(event, claim_on);
    }

    pub fn toggle_on(&mut self, key: ScenarioKey) {
        self.apply(ToggleEvent::On(key));
    }

    pub fn toggle_off(&mut self, key: ScenarioKey) {
        self.apply(ToggleEvent::Off(key));
    }

    /// Whether a key is toggled on, regardless of suppression.
    pub fn contains(&self, key: ScenarioKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn keys(&self) -> &BTreeSet<ScenarioKey> {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn alameda_treatment(&self) -> AlamedaTreatment {
        self.treatment
    }

    /// Parse a comma-separated token list such as `ZERO_SAM,SUBCON`.
    pub fn parse_list(list: &str) -> Result<Self, UnknownScenarioKey> {
        let mut selection = Self::new();
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            selection.toggle_on(token.parse()?);
        }
        Ok(selection)
    }
}

impl FromIterator<ScenarioKey> for Selection {
    fn from_iter<T: IntoIterator<Item = ScenarioKey>>(iter: T) -> Self {
        let mut selection = Self::new();
        for key in iter {
            selection.toggle_on(key);
        }
        selection
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            return f.write_str("(baseline)");
        }
        let tokens: Vec<&str> = self.keys.iter().map(|k| k.token()).collect();
        f.write_str(&tokens.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for key in ScenarioKey::ALL {
            assert_eq!(key.token().parse::<ScenarioKey>().unwrap(), key);
        }
        assert!("SUBCON_EU".parse::<ScenarioKey>().is_err());
    }

    #[test]
    fn test_subcon_overrides_claim() {
        let mut selection = Selection::new();
        selection.toggle_on(ScenarioKey::ClaimAlameda);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::ClaimSelected);

        selection.toggle_on(ScenarioKey::Subcon);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::SubconSelected);

        selection.toggle_on(ScenarioKey::ClaimAlameda);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::SubconSelected);
    }

    #[test]
    fn test_claim_reinstated_when_subcon_removed() {
        let mut selection: Selection = [ScenarioKey::Subcon, ScenarioKey::ClaimAlameda]
            .into_iter()
            .collect();
        selection.toggle_off(ScenarioKey::Subcon);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::ClaimSelected);
        selection.toggle_off(ScenarioKey::ClaimAlameda);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::None);
    }

    #[test]
    fn test_claim_off_under_subcon_keeps_subcon() {
        let mut selection: Selection = [ScenarioKey::ClaimAlameda, ScenarioKey::Subcon]
            .into_iter()
            .collect();
        selection.toggle_off(ScenarioKey::ClaimAlameda);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::SubconSelected);
        selection.toggle_off(ScenarioKey::Subcon);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::None);
    }

    #[test]
    fn test_unrelated_keys_do_not_move_treatment() {
        let mut selection = Selection::new();
        selection.toggle_on(ScenarioKey::SubconUs);
        selection.toggle_on(ScenarioKey::ZeroSam);
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::None);
    }

    #[test]
    fn test_redundant_off_is_harmless() {
        let mut selection = Selection::new();
        selection.toggle_off(ScenarioKey::Subcon);
        assert!(selection.is_empty());
        assert_eq!(selection.alameda_treatment(), AlamedaTreatment::None);
    }

    #[test]
    fn test_parse_list() {
        let selection = Selection::parse_list("ZERO_SAM, SUBCON_US,").unwrap();
        assert!(selection.contains(ScenarioKey::ZeroSam));
        assert!(selection.contains(ScenarioKey::SubconUs));
        assert_eq!(selection.to_string(), "ZERO_SAM,SUBCON_US");
        assert!(Selection::parse_list("ZERO_SAM,NOPE").is_err());
    }
}
