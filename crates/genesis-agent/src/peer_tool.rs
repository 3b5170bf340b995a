//! §4.6 Peer-Agent Tool Generation.

use crate::tool::{ToolDefinition, ToolEntry, ToolSource};
use genesis_core::advertisement::Kind;
use genesis_core::Advertisement;
use serde_json::json;

/// Lowercases, replaces whitespace and `-` with `_`, and drops
/// non-alphanumerics (other than the underscores just introduced).
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_whitespace() || ch == '-' {
            out.push('_');
        } else if ch.is_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        }
        // everything else is dropped
    }
    out
}

fn strip_suffix_ci<'a>(input: &'a str, suffix: &str) -> &'a str {
    if input.len() >= suffix.len()
        && input[input.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        &input[..input.len() - suffix.len()]
    } else {
        input
    }
}

/// The universal agent-tool parameter schema (§4.5 step 5): every peer
/// agent tool takes `{message: string}` regardless of the target's
/// internal capabilities, so tool shape never drifts with what the peer
/// happens to expose (§9 design note).
pub fn universal_agent_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "message": { "type": "string" }
        },
        "required": ["message"]
    })
}

/// Derive zero or more tool names for one discovered peer agent, from its
/// `specializations`, `service_name`, and `capabilities`, in that order,
/// falling back to a `kind`-derived classifier when all three are empty.
/// Tools are named by capability, never by the agent's own `name`: two
/// unrelated agents with identical capabilities should surface identical
/// tool names, and an agent's identity should never leak into a name an LLM
/// picks a tool by.
pub fn generate_tool_names(advertisement: &Advertisement) -> Vec<String> {
    let mut names = Vec::new();

    for s in &advertisement.specializations {
        names.push(format!("get_{}_info", normalize(s)));
    }

    if !advertisement.service_name.is_empty() {
        let stripped = strip_suffix_ci(&advertisement.service_name, "service");
        names.push(format!("use_{}_service", normalize(stripped)));
    }

    for c in &advertisement.capabilities {
        names.push(format!("request_{}", normalize(c)));
    }

    if names.is_empty() {
        names.push(format!("consult_{}", kind_label(advertisement.kind)));
    }

    names
}

/// Generic capability classifier for an advertisement with no declared
/// specializations, service name, or capabilities — the role it plays,
/// not who it is.
fn kind_label(kind: Kind) -> &'static str {
    match kind {
        Kind::Agent => "agent",
        Kind::Service => "service",
        Kind::Function => "function",
    }
}

/// Build the tool entries a peer agent contributes to one agent's tool set.
/// Multiple `tool_name`s may map to the same `target_agent_id`.
pub fn tool_entries_for(advertisement: &Advertisement) -> Vec<ToolEntry> {
    let description = format!(
        "Delegate to peer agent '{}' (service '{}')",
        advertisement.name, advertisement.service_name
    );
    generate_tool_names(advertisement)
        .into_iter()
        .map(|tool_name| ToolEntry {
            definition: ToolDefinition {
                name: tool_name,
                description: description.clone(),
                parameters: universal_agent_schema(),
            },
            source: ToolSource::PeerAgent {
                target_agent_id: advertisement.provider_id,
                service_name: advertisement.service_name.clone(),
            },
        })
        .collect()
}

/// Merge newly discovered peer-agent tool entries into an existing cache
/// keyed by tool name, keeping the most recently discovered mapping when
/// names collide across agents and logging an observable warning (§4.6).
pub fn merge_into_cache(
    cache: &mut std::collections::HashMap<String, ToolEntry>,
    entries: Vec<ToolEntry>,
) {
    for entry in entries {
        if let Some(existing) = cache.get(&entry.definition.name) {
            if let (
                ToolSource::PeerAgent { target_agent_id: old, .. },
                ToolSource::PeerAgent { target_agent_id: new, .. },
            ) = (&existing.source, &entry.source)
            {
                if old != new {
                    tracing::warn!(
                        tool_name = %entry.definition.name,
                        old_target = %old,
                        new_target = %new,
                        "peer-agent tool name collision; keeping most recently discovered mapping"
                    );
                }
            }
        }
        cache.insert(entry.definition.name.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_core::{Guid, Kind};
    use serde_json::json as js;
    use time::OffsetDateTime;

    fn weather_ad() -> Advertisement {
        Advertisement {
            advertisement_id: "a1".to_string(),
            kind: Kind::Agent,
            name: "WeatherAgent".to_string(),
            service_name: "WeatherService".to_string(),
            provider_id: Guid::new(),
            schema_json: js({}),
            capabilities: vec!["forecast".to_string()],
            classification_tags: vec![],
            specializations: vec!["weather".to_string()],
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn normalize_lowercases_and_collapses_separators() {
        assert_eq!(normalize("Hello World"), "hello_world");
        assert_eq!(normalize("multi-word-thing"), "multi_word_thing");
        assert_eq!(normalize("Weird!!Chars??"), "weirdchars");
    }

    #[test]
    fn generates_names_from_specialization_service_and_capability() {
        let names = generate_tool_names(&weather_ad());
        assert_eq!(
            names,
            vec![
                "get_weather_info".to_string(),
                "use_weather_service".to_string(),
                "request_forecast".to_string(),
            ]
        );
    }

    #[test]
    fn falls_back_to_a_kind_classifier_not_the_agent_name() {
        let mut ad = weather_ad();
        ad.specializations.clear();
        ad.capabilities.clear();
        ad.service_name.clear();
        let names = generate_tool_names(&ad);
        assert_eq!(names, vec!["consult_agent".to_string()]);

        // Two unrelated, equally uninformative agents collapse onto the
        // same fallback name — capability-named, not identity-named.
        let mut other = ad.clone();
        other.name = "SomeOtherAgent".to_string();
        other.advertisement_id = "a2".to_string();
        assert_eq!(generate_tool_names(&other), names);
    }

    #[test]
    fn every_peer_tool_uses_the_universal_message_schema() {
        for entry in tool_entries_for(&weather_ad()) {
            assert_eq!(entry.definition.parameters, universal_agent_schema());
        }
    }

    #[test]
    fn collision_keeps_most_recently_discovered_mapping() {
        let mut cache = std::collections::HashMap::new();
        let ad1 = weather_ad();
        let mut ad2 = weather_ad();
        ad2.provider_id = Guid::new();
        ad2.advertisement_id = "a2".to_string();

        merge_into_cache(&mut cache, tool_entries_for(&ad1));
        merge_into_cache(&mut cache, tool_entries_for(&ad2));

        let entry = &cache["get_weather_info"];
        match entry.source {
            ToolSource::PeerAgent { target_agent_id, .. } => {
                assert_eq!(target_agent_id, ad2.provider_id);
            }
            _ => panic!("expected peer agent source"),
        }
    }
}
