//! §6 CLI surface: a thin interface-side driver built on
//! [`genesis_agent::Interface`]. Binds a fresh `LocalBus`-backed
//! `Participant` per invocation; a deployment with a real network bus
//! binding would plug it in at the same `Arc<dyn AdvertisementBus>` seam.

mod cli_args;

use anyhow::{anyhow, Context};
use clap::Parser;
use cli_args::CliArgs;
use genesis_agent::Interface;
use genesis_core::advertisement::{Advertisement, AdvertisementEvent, Kind};
use genesis_core::bus::LocalBus;
use genesis_core::{GenesisError, Participant};
use genesis_rpc::RpcError;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let participant = Participant::local(Arc::new(LocalBus::new()));
    match run(participant, &args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "genesis CLI exiting non-zero");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

/// Wait for, then address, one matching agent; relay every configured
/// message to it in order.
async fn run(participant: Participant, args: &CliArgs) -> anyhow::Result<()> {
    let messages = args.all_messages().context("reading --messages-file")?;
    if messages.is_empty() {
        return Err(anyhow!("no messages to send: pass --message and/or --messages-file"));
    }

    let target = wait_for_agent(&participant, args)
        .await
        .map_err(|e| anyhow!("{e}"))?;
    tracing::info!(
        agent = %target.name,
        provider_id = %target.provider_id,
        service = %args.select_service,
        "addressing agent"
    );

    let mut interface = Interface::new(participant, args.select_service.clone());

    for (idx, message) in messages.iter().enumerate() {
        let timeout = if idx == 0 {
            Duration::from_secs(args.connect_timeout)
        } else {
            Duration::from_secs(args.request_timeout)
        };

        let reply = interface
            .send_message(message.clone(), timeout)
            .await
            .map_err(|e| rpc_error_to_anyhow(e, &args.select_service))?;

        if reply.status.is_success() {
            match reply.message.get("message").and_then(|m| m.as_str()) {
                Some(text) => println!("{text}"),
                None => println!("{}", reply.message),
            }
        } else {
            println!("[status {}] {}", reply.status.code(), reply.message);
        }

        if args.sleep_between > 0 && idx + 1 < messages.len() {
            tokio::time::sleep(Duration::from_secs(args.sleep_between)).await;
        }
    }

    Ok(())
}

fn rpc_error_to_anyhow(e: RpcError, service_name: &str) -> anyhow::Error {
    let genesis_error: GenesisError = e.into();
    anyhow!("RPC to '{service_name}' failed: {genesis_error}")
}

/// Wait (up to `--max-wait`) for at least one agent advertisement matching
/// `--select-service` (and `--select-name`, if given). With
/// `--select-first`, returns as soon as the first match is observed; by
/// default it instead waits out the whole window so late-arriving
/// advertisements are still counted, then returns the earliest match seen —
/// which agent actually answers is decided at the RPC layer's rank-0
/// tie-break (§4.3), not by this selection.
async fn wait_for_agent(participant: &Participant, args: &CliArgs) -> genesis_core::Result<Advertisement> {
    let matches = |ad: &Advertisement| -> bool {
        matches!(ad.kind, Kind::Agent)
            && ad.service_name == args.select_service
            && args.select_name.as_deref().map_or(true, |n| n == ad.name)
    };

    let mut subscription = participant.bus().subscribe(Some(Kind::Agent));
    let mut found = subscription.initial.into_iter().find(|ad| matches(ad));

    if found.is_some() && args.select_first {
        return Ok(found.unwrap());
    }

    let deadline = Duration::from_secs(args.max_wait);
    let collect = async {
        while let Some(event) = subscription.events.recv().await {
            if let AdvertisementEvent::Alive(ad) = event {
                if matches(&ad) {
                    if found.is_none() {
                        found = Some(ad);
                    }
                    if args.select_first {
                        break;
                    }
                }
            }
        }
    };
    let _ = tokio::time::timeout(deadline, collect).await;

    found.ok_or_else(|| GenesisError::DiscoveryTimeout {
        service_name: args.select_service.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn test_args(service_name: &str) -> CliArgs {
        CliArgs {
            select_service: service_name.to_string(),
            select_name: None,
            select_first: false,
            messages: vec![],
            messages_file: None,
            max_wait: 0,
            connect_timeout: 1,
            request_timeout: 1,
            sleep_between: 0,
            verbose: 0,
        }
    }

    fn agent_ad(service_name: &str, name: &str) -> Advertisement {
        Advertisement {
            advertisement_id: format!("{service_name}/{name}"),
            kind: Kind::Agent,
            name: name.to_string(),
            service_name: service_name.to_string(),
            provider_id: genesis_core::Guid::new(),
            schema_json: serde_json::json!({}),
            capabilities: vec![],
            classification_tags: vec![],
            specializations: vec![],
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn wait_for_agent_returns_immediately_on_a_cached_match() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        participant.bus().publish(agent_ad("Weather", "Weather-1")).await.unwrap();

        let mut args = test_args("Weather");
        args.select_first = true;
        let found = wait_for_agent(&participant, &args).await.unwrap();
        assert_eq!(found.name, "Weather-1");
    }

    #[tokio::test]
    async fn wait_for_agent_times_out_with_no_match() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        let args = test_args("Nobody");
        let err = wait_for_agent(&participant, &args).await.unwrap_err();
        assert!(matches!(err, GenesisError::DiscoveryTimeout { .. }));
    }

    #[tokio::test]
    async fn wait_for_agent_respects_select_name() {
        let participant = Participant::local(Arc::new(LocalBus::new()));
        participant.bus().publish(agent_ad("Weather", "Weather-1")).await.unwrap();

        let mut args = test_args("Weather");
        args.select_name = Some("Weather-2".to_string());
        let err = wait_for_agent(&participant, &args).await.unwrap_err();
        assert!(matches!(err, GenesisError::DiscoveryTimeout { .. }));
    }

    #[test]
    fn all_messages_combines_flag_values_and_file_lines() {
        let path = std::env::temp_dir().join("genesis_cli_test_messages.txt");
        std::fs::write(&path, "first from file\n\nsecond from file\n").unwrap();

        let mut args = test_args("Weather");
        args.messages = vec!["from flag".to_string()];
        args.messages_file = Some(path.clone());

        let messages = args.all_messages().unwrap();
        assert_eq!(messages, vec!["from flag", "first from file", "second from file"]);

        std::fs::remove_file(&path).unwrap();
    }
}
