use crate::state::Clients;

fn mark(ok: bool) -> &'static str {
    if ok { "✅ reachable" } else { "❌ unreachable" }
}

pub async fn cmd_check(clients: &Clients) -> anyhow::Result<()> {
    println!("Checking backends...");
    println!("{:-<40}", "");

    let radarr = clients.radarr.is_available().await;
    println!("Radarr:       {}", mark(radarr));

    match &clients.sonarr {
        Some(sonarr) => println!("Sonarr:       {}", mark(sonarr.is_available().await)),
        None => println!("Sonarr:       disabled"),
    }
    match &clients.plex {
        Some(plex) => println!("Plex:         {}", mark(plex.is_available().await)),
        None => println!("Plex:         disabled"),
    }
    match &clients.transmission {
        Some(transmission) => {
            println!("Transmission: {}", mark(transmission.is_available().await));
        }
        None => println!("Transmission: disabled"),
    }

    if !radarr {
        anyhow::bail!("Radarr is not reachable");
    }
    Ok(())
}
