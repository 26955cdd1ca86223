use std::collections::BTreeSet;
use std::io::Write;

use crate::render::SelectOption;

pub fn print_options(options: &[SelectOption]) {
    for (i, option) in options.iter().enumerate() {
        let marker = if option.default { " *" } else { "" };
        println!("[{}] {}{marker}", i + 1, option.label);
        if let Some(description) = &option.description {
            println!("    {description}");
        }
    }
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt} ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Parses a 1-based pick. `None` means cancel (empty or `q`).
pub fn parse_choice(input: &str, count: usize) -> Result<Option<usize>, String> {
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(Some(n - 1)),
        _ => Err(format!("Enter a number between 1 and {count}, or 'q' to cancel.")),
    }
}

/// Parses a comma-separated list of 1-based picks, or `all`. Empty input
/// selects nothing.
pub fn parse_multi_choice(input: &str, count: usize) -> Result<BTreeSet<usize>, String> {
    if input.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }
    let mut picked = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                picked.insert(n - 1);
            }
            _ => return Err(format!("'{part}' is not between 1 and {count}.")),
        }
    }
    Ok(picked)
}

/// Console control for a running tracking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    Refresh,
    Stop,
}

/// `r` refreshes now, `s` or `q` stops. Anything else is ignored.
pub fn parse_tracking_command(input: &str) -> Option<TrackingCommand> {
    match input.trim().to_ascii_lowercase().as_str() {
        "r" | "refresh" => Some(TrackingCommand::Refresh),
        "s" | "stop" | "q" => Some(TrackingCommand::Stop),
        _ => None,
    }
}

/// Asks until a valid pick or a cancel.
pub fn choose(prompt: &str, count: usize) -> anyhow::Result<Option<usize>> {
    loop {
        let input = read_line(prompt)?;
        match parse_choice(&input, count) {
            Ok(choice) => return Ok(choice),
            Err(msg) => println!("{msg}"),
        }
    }
}

pub fn choose_many(prompt: &str, count: usize) -> anyhow::Result<BTreeSet<usize>> {
    loop {
        let input = read_line(prompt)?;
        match parse_multi_choice(&input, count) {
            Ok(picked) => return Ok(picked),
            Err(msg) => println!("{msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2", 3), Ok(Some(1)));
        assert_eq!(parse_choice("q", 3), Ok(None));
        assert_eq!(parse_choice("", 3), Ok(None));
        assert!(parse_choice("4", 3).is_err());
        assert!(parse_choice("zero", 3).is_err());
    }

    #[test]
    fn test_parse_multi_choice() {
        assert_eq!(parse_multi_choice("1, 3", 3), Ok(BTreeSet::from([0, 2])));
        assert_eq!(parse_multi_choice("all", 2), Ok(BTreeSet::from([0, 1])));
        assert_eq!(parse_multi_choice("", 2), Ok(BTreeSet::new()));
        assert!(parse_multi_choice("1,9", 3).is_err());
    }

    #[test]
    fn test_parse_tracking_command() {
        assert_eq!(parse_tracking_command("r"), Some(TrackingCommand::Refresh));
        assert_eq!(parse_tracking_command(" Refresh \n"), Some(TrackingCommand::Refresh));
        assert_eq!(parse_tracking_command("s"), Some(TrackingCommand::Stop));
        assert_eq!(parse_tracking_command("Q"), Some(TrackingCommand::Stop));
        assert_eq!(parse_tracking_command(""), None);
        assert_eq!(parse_tracking_command("1"), None);
    }
}
