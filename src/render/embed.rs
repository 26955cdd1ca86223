use crate::constants::{colors, glyphs};
use crate::domain::MediaKind;
use crate::services::status::{StatusReport, TrackState};

use super::{Action, Embed, Message};

/// Fixed-width progress bar. An unknown percent renders the placeholder
/// glyph, so it never reads as 0 %.
///
/// # Examples
///
/// ```rust
/// use slavarr::render::progress_bar;
///
/// assert_eq!(progress_bar(Some(50.0), 4), "██░░");
/// assert_eq!(progress_bar(None, 3), "∙∙∙");
/// ```
#[must_use]
pub fn progress_bar(percent: Option<f64>, width: usize) -> String {
    let Some(pct) = percent.filter(|p| !p.is_nan()) else {
        return glyphs::BAR_UNKNOWN.to_string().repeat(width);
    };
    let pct = pct.clamp(0.0, 100.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((pct / 100.0 * width as f64).round() as usize).min(width);

    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n(glyphs::BAR_FILLED, filled));
    bar.extend(std::iter::repeat_n(glyphs::BAR_EMPTY, width - filled));
    bar
}

fn percent_text(percent: Option<f64>) -> String {
    percent.map_or_else(|| "?%".to_string(), |p| format!("{:.1}%", p.clamp(0.0, 100.0)))
}

const fn color_for(report: &StatusReport) -> u32 {
    match report.state {
        TrackState::Downloaded | TrackState::Complete => colors::GREEN,
        TrackState::Downloading => colors::ORANGE,
        TrackState::Queued | TrackState::Waiting => colors::GREY,
        TrackState::NotFound => colors::RED,
    }
}

/// Rich status card for one report.
#[must_use]
pub fn status_embed(report: &StatusReport, bar_width: usize) -> Embed {
    let mut embed = Embed::new(report.title.clone(), color_for(report));
    embed.thumbnail.clone_from(&report.poster);

    if report.state == TrackState::NotFound {
        embed.description = Some(report.state.label(report.kind).to_string());
        return embed;
    }

    let state = report.state.label(report.kind);
    match report.kind {
        MediaKind::Movie => match report.state {
            TrackState::Downloading => {
                let eta = report
                    .eta
                    .as_deref()
                    .map(|eta| format!(" • ETA {eta}"))
                    .unwrap_or_default();
                embed = embed.field("State", state, true).field(
                    "Progress",
                    format!(
                        "`{}` {}{eta}",
                        progress_bar(report.percent, bar_width),
                        percent_text(report.percent)
                    ),
                    false,
                );
            }
            _ => embed = embed.field("State", state, false),
        },
        MediaKind::Series => {
            let (have, total) = report.episodes.unwrap_or_default();
            embed = embed
                .field(
                    "Progress",
                    format!(
                        "`{}` {}  ({have}/{total} eps)",
                        progress_bar(report.percent, bar_width),
                        percent_text(report.percent)
                    ),
                    false,
                )
                .field("State", state, true);
        }
    }

    if let Some(line) = &report.transfer {
        embed = embed.field("Transmission", line.clone(), false);
    }
    embed
}

/// Message the tracking loop edits in place. Finished reports drop the
/// action buttons.
#[must_use]
pub fn tracking_message(report: &StatusReport, bar_width: usize) -> Message {
    let message = Message::default().with_embed(status_embed(report, bar_width));
    if report.done {
        message
    } else {
        message.with_actions(&[Action::RefreshNow, Action::StopTracking])
    }
}

/// Final state of a message whose tracking was stopped by the user.
#[must_use]
pub fn stopped_message(report: Option<&StatusReport>, bar_width: usize) -> Message {
    let message = Message::text("🛑 Tracking stopped.");
    match report {
        Some(report) => message.with_embed(status_embed(report, bar_width)),
        None => message,
    }
}
