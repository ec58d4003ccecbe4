//! Branch policy configuration types.
//!
//! A policy configuration carries a settings object whose shape depends on
//! the policy type. Instead of an untyped map, the settings are decoded into
//! [`PolicySettings`], selected by the configuration's type GUID.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// The policy types this provider manages.
///
/// Type GUIDs are global across Azure DevOps organizations and can be listed
/// with the `_apis/policy/types` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Require all pull request comments to be resolved.
    NoActiveComments,
    /// Require a minimum number of reviewers.
    MinReviewerCount,
    /// Require a successful build before completing a pull request.
    SuccessfulBuild,
}

impl PolicyKind {
    /// Every known kind, in type-table order.
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::NoActiveComments,
        PolicyKind::MinReviewerCount,
        PolicyKind::SuccessfulBuild,
    ];

    /// The Azure DevOps policy type GUID for this kind.
    #[must_use]
    pub const fn type_id(self) -> Uuid {
        match self {
            Self::NoActiveComments => Uuid::from_u128(0xc6a1889d_b943_4856_b76f_9e46bb6b0df2),
            Self::MinReviewerCount => Uuid::from_u128(0xfa4e907d_c16b_4a4c_9dfa_4906e5d171dd),
            Self::SuccessfulBuild => Uuid::from_u128(0x0609b952_1397_4640_95ec_e00a01b2c241),
        }
    }

    /// Looks up the kind registered for a type GUID.
    #[must_use]
    pub fn from_type_id(id: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_id() == id)
    }

    /// Human-readable name, as used by the policy types endpoint.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoActiveComments => "Comment requirements",
            Self::MinReviewerCount => "Minimum number of reviewers",
            Self::SuccessfulBuild => "Build",
        }
    }
}

/// Branch name matching strategy of a policy scope.
///
/// Kinds the provider does not configure itself, such as `DefaultBranch`,
/// are kept as received so they flatten back with the API's spelling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchType {
    /// The ref name must match exactly.
    #[default]
    Exact,
    /// The ref name is a prefix of the branches the policy applies to.
    Prefix,
    /// Any other match kind reported by the API.
    Other(String),
}

impl MatchType {
    /// Every value accepted in configuration, spelled the way the API spells them.
    pub const VALUES: [&'static str; 2] = ["Exact", "Prefix"];

    /// Parses a configurable match type, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "prefix" => Some(Self::Prefix),
            _ => None,
        }
    }

    /// The canonical spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact => "Exact",
            Self::Prefix => "Prefix",
            Self::Other(kind) => kind.as_str(),
        }
    }
}

impl From<String> for MatchType {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(Self::Other(value))
    }
}

impl From<MatchType> for String {
    fn from(value: MatchType) -> Self {
        match value {
            MatchType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (repository, ref, match kind) triple restricting where a policy applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyScope {
    /// Repository GUID; absent means every repository in the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
    /// Ref name such as `refs/heads/main`; absent means every branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    /// How `ref_name` is matched.
    #[serde(default)]
    pub match_kind: MatchType,
}

/// Settings of the minimum reviewers policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinReviewerSettings {
    #[serde(default)]
    pub scope: Vec<PolicyScope>,
    #[serde(default)]
    pub minimum_approver_count: i32,
    #[serde(default)]
    pub creator_vote_counts: bool,
}

/// Settings of the comment resolution policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResolutionSettings {
    #[serde(default)]
    pub scope: Vec<PolicyScope>,
}

/// Settings of the build validation policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildValidationSettings {
    #[serde(default)]
    pub scope: Vec<PolicyScope>,
    #[serde(default)]
    pub build_definition_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Minutes a successful build stays valid; zero means forever.
    #[serde(default)]
    pub valid_duration: f64,
    #[serde(default)]
    pub queue_on_source_update_only: bool,
    #[serde(default)]
    pub manual_queue_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filename_patterns: Vec<String>,
}

/// Type-specific policy settings, selected by the policy type GUID.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicySettings {
    MinReviewerCount(MinReviewerSettings),
    NoActiveComments(CommentResolutionSettings),
    SuccessfulBuild(BuildValidationSettings),
}

impl PolicySettings {
    /// Default settings of `kind` restricted to `scope`.
    #[must_use]
    pub fn with_scope(kind: PolicyKind, scope: Vec<PolicyScope>) -> Self {
        match kind {
            PolicyKind::MinReviewerCount => Self::MinReviewerCount(MinReviewerSettings {
                scope,
                ..Default::default()
            }),
            PolicyKind::NoActiveComments => {
                Self::NoActiveComments(CommentResolutionSettings { scope })
            }
            PolicyKind::SuccessfulBuild => Self::SuccessfulBuild(BuildValidationSettings {
                scope,
                ..Default::default()
            }),
        }
    }

    /// Decodes a raw settings object as the shape used by `kind`.
    ///
    /// Unknown fields are ignored.
    pub fn decode(kind: PolicyKind, value: Value) -> Result<Self, serde_json::Error> {
        let value = if value.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            value
        };
        Ok(match kind {
            PolicyKind::MinReviewerCount => Self::MinReviewerCount(serde_json::from_value(value)?),
            PolicyKind::NoActiveComments => Self::NoActiveComments(serde_json::from_value(value)?),
            PolicyKind::SuccessfulBuild => Self::SuccessfulBuild(serde_json::from_value(value)?),
        })
    }

    /// The policy kind these settings belong to.
    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::MinReviewerCount(_) => PolicyKind::MinReviewerCount,
            Self::NoActiveComments(_) => PolicyKind::NoActiveComments,
            Self::SuccessfulBuild(_) => PolicyKind::SuccessfulBuild,
        }
    }

    /// The scope entries shared by every policy kind.
    #[must_use]
    pub fn scope(&self) -> &[PolicyScope] {
        match self {
            Self::MinReviewerCount(s) => &s.scope,
            Self::NoActiveComments(s) => &s.scope,
            Self::SuccessfulBuild(s) => &s.scope,
        }
    }
}

/// Reference to a policy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyTypeRef {
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

/// Wire shape of a policy configuration with the settings left generic.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePolicyConfiguration<S> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i32>,
    #[serde(rename = "type")]
    policy_type: PolicyTypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_blocking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<i32>,
    settings: S,
}

/// A branch policy configuration as exchanged with the policy API.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfiguration {
    /// Server-assigned ID; `None` until created.
    pub id: Option<i32>,
    pub is_enabled: Option<bool>,
    pub is_blocking: Option<bool>,
    /// Server-side revision counter.
    pub revision: Option<i32>,
    pub settings: PolicySettings,
}

impl PolicyConfiguration {
    /// A new, not yet created configuration.
    #[must_use]
    pub fn new(settings: PolicySettings) -> Self {
        Self {
            id: None,
            is_enabled: None,
            is_blocking: None,
            revision: None,
            settings,
        }
    }

    /// The policy kind, derived from the settings variant.
    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        self.settings.kind()
    }
}

impl Serialize for PolicyConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.kind();
        WirePolicyConfiguration {
            id: self.id,
            policy_type: PolicyTypeRef {
                id: kind.type_id(),
                display_name: None,
            },
            is_enabled: self.is_enabled,
            is_blocking: self.is_blocking,
            revision: self.revision,
            settings: &self.settings,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PolicyConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WirePolicyConfiguration::<Value>::deserialize(deserializer)?;
        let kind = PolicyKind::from_type_id(wire.policy_type.id).ok_or_else(|| {
            D::Error::custom(format!("unsupported policy type {}", wire.policy_type.id))
        })?;
        let settings = PolicySettings::decode(kind, wire.settings).map_err(D::Error::custom)?;
        Ok(Self {
            id: wire.id,
            is_enabled: wire.is_enabled,
            is_blocking: wire.is_blocking,
            revision: wire.revision,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// # Policy Kind Table
    ///
    /// Tests the constant kind to GUID table in both directions.
    ///
    /// ## Test Scenario
    /// - Maps every kind to its GUID and back
    /// - Looks up an unregistered GUID
    ///
    /// ## Expected Outcome
    /// - Every kind round-trips, the unknown GUID yields None
    #[test]
    fn test_policy_kind_table() {
        assert_eq!(
            PolicyKind::MinReviewerCount.type_id().to_string(),
            "fa4e907d-c16b-4a4c-9dfa-4906e5d171dd"
        );
        assert_eq!(
            PolicyKind::NoActiveComments.type_id().to_string(),
            "c6a1889d-b943-4856-b76f-9e46bb6b0df2"
        );
        assert_eq!(
            PolicyKind::SuccessfulBuild.type_id().to_string(),
            "0609b952-1397-4640-95ec-e00a01b2c241"
        );
        for kind in PolicyKind::ALL {
            assert_eq!(PolicyKind::from_type_id(kind.type_id()), Some(kind));
        }
        assert_eq!(PolicyKind::from_type_id(Uuid::nil()), None);
    }

    /// # Match Type Parsing
    ///
    /// Tests case-insensitive parsing and the Exact default.
    ///
    /// ## Test Scenario
    /// - Parses mixed-case spellings and an invalid value
    /// - Decodes a scope without a matchKind field
    ///
    /// ## Expected Outcome
    /// - Spellings are normalized, missing matchKind is Exact
    #[test]
    fn test_match_type_parsing() {
        assert_eq!(MatchType::parse("prefix"), Some(MatchType::Prefix));
        assert_eq!(MatchType::parse("EXACT"), Some(MatchType::Exact));
        assert_eq!(MatchType::parse("Suffix"), None);
        assert_eq!(MatchType::from("prefix".to_string()), MatchType::Prefix);

        let scope: PolicyScope =
            serde_json::from_value(json!({"repositoryId": "r1", "refName": "refs/heads/main"}))
                .unwrap();
        assert_eq!(scope.match_kind, MatchType::Exact);
    }

    /// # Configuration Decoding
    ///
    /// Tests that the settings variant is chosen by the type GUID and that
    /// unknown fields are tolerated.
    ///
    /// ## Test Scenario
    /// - Decodes a minimum reviewers configuration with extra fields
    ///
    /// ## Expected Outcome
    /// - The MinReviewerCount variant carries the scope and counts
    #[test]
    fn test_configuration_decoding() {
        let raw = json!({
            "id": 42,
            "revision": 3,
            "isEnabled": true,
            "isBlocking": false,
            "isDeleted": false,
            "createdBy": {"displayName": "someone"},
            "type": {
                "id": "fa4e907d-c16b-4a4c-9dfa-4906e5d171dd",
                "displayName": "Minimum number of reviewers"
            },
            "settings": {
                "minimumApproverCount": 2,
                "creatorVoteCounts": true,
                "allowDownvotes": false,
                "scope": [{
                    "repositoryId": "r1",
                    "refName": "refs/heads/main",
                    "matchKind": "Prefix"
                }]
            }
        });

        let config: PolicyConfiguration = serde_json::from_value(raw).unwrap();
        assert_eq!(config.id, Some(42));
        assert_eq!(config.is_blocking, Some(false));
        match &config.settings {
            PolicySettings::MinReviewerCount(s) => {
                assert_eq!(s.minimum_approver_count, 2);
                assert!(s.creator_vote_counts);
                assert_eq!(s.scope[0].match_kind, MatchType::Prefix);
            }
            other => panic!("unexpected settings: {other:?}"),
        }
    }

    /// # Unconfigurable Match Kinds
    ///
    /// Tests that a scope using a match kind outside Exact and Prefix decodes
    /// and encodes with its original spelling.
    ///
    /// ## Test Scenario
    /// - Decodes a comment resolution configuration whose scope has
    ///   matchKind DefaultBranch
    /// - Encodes it again
    ///
    /// ## Expected Outcome
    /// - The scope carries MatchType::Other("DefaultBranch")
    /// - The encoded scope spells the kind DefaultBranch
    #[test]
    fn test_default_branch_match_kind() {
        let raw = json!({
            "id": 5,
            "type": {"id": "c6a1889d-b943-4856-b76f-9e46bb6b0df2"},
            "settings": {
                "scope": [{"repositoryId": null, "matchKind": "DefaultBranch"}]
            }
        });

        let config: PolicyConfiguration = serde_json::from_value(raw).unwrap();
        let scope = &config.settings.scope()[0];
        assert_eq!(config.kind(), PolicyKind::NoActiveComments);
        assert_eq!(scope.match_kind, MatchType::Other("DefaultBranch".into()));
        assert_eq!(scope.match_kind.as_str(), "DefaultBranch");
        assert_eq!(scope.repository_id, None);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["settings"]["scope"][0]["matchKind"], json!("DefaultBranch"));
    }

    /// # Unknown Policy Type
    ///
    /// Tests that a configuration with an unregistered type GUID is rejected.
    ///
    /// ## Test Scenario
    /// - Decodes a configuration whose type is the nil GUID
    ///
    /// ## Expected Outcome
    /// - Decoding fails with an unsupported policy type message
    #[test]
    fn test_unknown_policy_type_rejected() {
        let raw = json!({
            "id": 1,
            "type": {"id": "00000000-0000-0000-0000-000000000000"},
            "settings": {}
        });
        let err = serde_json::from_value::<PolicyConfiguration>(raw).unwrap_err();
        assert!(err.to_string().contains("unsupported policy type"));
    }

    /// # Configuration Encoding
    ///
    /// Tests the request payload produced for a new configuration.
    ///
    /// ## Test Scenario
    /// - Serializes a comment resolution configuration without an ID
    ///
    /// ## Expected Outcome
    /// - The payload carries the type GUID, omits the ID and absent scope fields
    #[test]
    fn test_configuration_encoding() {
        let mut config = PolicyConfiguration::new(PolicySettings::with_scope(
            PolicyKind::NoActiveComments,
            vec![PolicyScope {
                repository_id: None,
                ref_name: Some("refs/heads/main".into()),
                match_kind: MatchType::Exact,
            }],
        ));
        config.is_enabled = Some(true);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "type": {"id": "c6a1889d-b943-4856-b76f-9e46bb6b0df2"},
                "isEnabled": true,
                "settings": {
                    "scope": [{"refName": "refs/heads/main", "matchKind": "Exact"}]
                }
            })
        );
    }
}
