use std::collections::BTreeSet;

use super::prompt::{choose, choose_many, print_options};
use super::status::follow_tracking;
use crate::domain::MediaKind;
use crate::error::RequestError;
use crate::render::options::release_options;
use crate::render::candidate_options;
use crate::services::{ReleaseCheck, SessionId};
use crate::wizard::{RequestWizard, WizardStep};

pub async fn cmd_movie_add(wizard: &RequestWizard, query: &str) -> anyhow::Result<()> {
    run_wizard(wizard, MediaKind::Movie, query).await
}

pub async fn cmd_series_add(wizard: &RequestWizard, query: &str) -> anyhow::Result<()> {
    run_wizard(wizard, MediaKind::Series, query).await
}

async fn run_wizard(wizard: &RequestWizard, kind: MediaKind, query: &str) -> anyhow::Result<()> {
    println!("Searching {} for: {query}", kind.backend_name());

    let results = match wizard.search(query, kind).await {
        Ok(results) => results,
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    let options = candidate_options(kind, &results);
    if options.is_empty() {
        println!("No results can be requested.");
        return Ok(());
    }

    println!();
    println!("Pick a result:");
    println!("{:-<60}", "");
    print_options(&options);

    let Some(index) = choose("Enter number to request, or 'q' to cancel:", options.len())? else {
        println!("Cancelled.");
        return Ok(());
    };
    let addressable: Vec<_> = results
        .iter()
        .filter(|c| c.candidate.ids.is_addressable(kind))
        .collect();
    let picked = addressable[index].candidate.clone();

    let step = match wizard.begin(kind, picked).await {
        Ok(step) => step,
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    if !configure(wizard, kind, &step).await? {
        wizard.cancel(step.session).await;
        println!("Cancelled.");
        return Ok(());
    }

    let outcome = loop {
        match wizard.confirm(step.session).await {
            Ok(outcome) => break outcome,
            Err(e) if e.is_recoverable() => {
                println!("{}", e.user_message());
                if !pick_tier(wizard, &step).await? {
                    wizard.cancel(step.session).await;
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            Err(e) => {
                println!("{}", e.user_message());
                return Ok(());
            }
        }
    };

    if !outcome.submission.failed_season_searches.is_empty() {
        println!(
            "Note: season search could not be started for {}.",
            outcome
                .submission
                .failed_season_searches
                .iter()
                .map(|n| format!("S{n}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let ReleaseCheck::PickerOffered(picker) = &outcome.release_check {
        let options = release_options(&picker.options);
        if !options.is_empty() {
            print_options(&options);
            if let Some(index) = choose("Enter number to grab, or 'q' to skip:", options.len())? {
                let option = &picker.options[index];
                wizard.grab(picker.target, option).await;
            }
        }
    }

    if let Some(handle) = outcome.tracking {
        follow_tracking(&handle).await;
    }
    Ok(())
}

/// Tier and (for series) season prompts. Returns false on cancel.
async fn configure(
    wizard: &RequestWizard,
    kind: MediaKind,
    step: &WizardStep,
) -> anyhow::Result<bool> {
    println!();
    println!("{}", step.prompt);
    if !pick_tier(wizard, step).await? {
        return Ok(false);
    }

    if kind == MediaKind::Series {
        pick_seasons(wizard, step.session, step).await?;
    }
    Ok(true)
}

async fn pick_tier(wizard: &RequestWizard, step: &WizardStep) -> anyhow::Result<bool> {
    print_options(&step.tiers);
    loop {
        let Some(index) = choose("Quality profile number:", step.tiers.len())? else {
            return Ok(false);
        };
        let Ok(tier_id) = step.tiers[index].value.parse::<i32>() else {
            continue;
        };
        match wizard.select_quality(step.session, tier_id).await {
            Ok(msg) => {
                println!("{msg}");
                return Ok(true);
            }
            Err(RequestError::Validation(msg)) => println!("{msg}"),
            Err(e) => return Err(anyhow::anyhow!(e.user_message())),
        }
    }
}

async fn pick_seasons(
    wizard: &RequestWizard,
    session: SessionId,
    step: &WizardStep,
) -> anyhow::Result<()> {
    if step.seasons.is_empty() {
        println!("No seasons listed for this series.");
        return Ok(());
    }
    println!();
    println!("Select seasons (comma-separated, 'all', or empty for none):");
    print_options(&step.seasons);

    loop {
        let picked = choose_many("Seasons:", step.seasons.len())?;
        let seasons: BTreeSet<i32> = picked
            .iter()
            .filter_map(|&i| step.seasons[i].value.parse().ok())
            .collect();
        match wizard.select_seasons(session, seasons).await {
            Ok(msg) => {
                println!("{msg}");
                return Ok(());
            }
            Err(RequestError::Validation(msg)) => println!("{msg}"),
            Err(e) => return Err(anyhow::anyhow!(e.user_message())),
        }
    }
}
