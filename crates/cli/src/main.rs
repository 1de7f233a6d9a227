mod persistence;

use anyhow::{bail, Context};
use lootchest_core::{
    CardId, ChestKind, Event, EventBus, Game, GameError, LootConfig, RngState, UpgradeKind,
    Variant,
};
use persistence::{default_save_path, FileStore};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const PROMPT: &str = "> ";

#[derive(Debug, Default)]
struct CliOptions {
    seed: Option<u64>,
    save: Option<PathBuf>,
}

fn parse_cli_options(args: &[String]) -> anyhow::Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--seed" => {
                let value = args.get(idx + 1).context("--seed needs a value")?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .with_context(|| format!("invalid seed {value:?}"))?,
                );
                idx += 1;
            }
            "--save" => {
                let value = args.get(idx + 1).context("--save needs a path")?;
                options.save = Some(PathBuf::from(value));
                idx += 1;
            }
            other => bail!("unknown option {other:?}"),
        }
        idx += 1;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args)?;

    let path = options
        .save
        .or_else(default_save_path)
        .context("no save path: pass --save or set LOOTCHEST_SAVE or HOME")?;
    let mut store = FileStore::new(path);
    let rng = match options.seed {
        Some(seed) => RngState::from_seed(seed),
        None => RngState::from_entropy(),
    };
    log::info!(
        "loading {} with seed {}",
        store.path().display(),
        rng.seed()
    );
    let mut game = Game::load_from(&store, LootConfig::default(), rng);
    run_repl(&mut game, &mut store)
}

fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn run_repl(game: &mut Game, store: &mut FileStore) -> anyhow::Result<()> {
    let mut events = EventBus::default();
    let mut last_tick = Instant::now();
    print_status(game);
    println!("type 'help' for commands");

    while let Some(line) = read_line(PROMPT)? {
        let now = Instant::now();
        let idle = game.tick_idle(now - last_tick, &mut events);
        last_tick = now;
        if idle > 0 {
            // Idle income is not echoed line by line.
            events.drain().for_each(drop);
        }

        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();
        let outcome = match command {
            "quit" | "exit" | "q" => {
                game.persist(store);
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                Ok(false)
            }
            "status" | "s" => {
                print_status(game);
                Ok(false)
            }
            "shop" => {
                print_shop(game);
                Ok(false)
            }
            "album" => cmd_album(game, &args),
            "click" | "c" => cmd_click(game, &args, &mut events),
            "wait" => cmd_wait(game, &args, &mut events),
            "buy" => cmd_buy(game, &args, &mut events),
            "chest" => cmd_chest(game, &args, &mut events),
            "reveal" | "r" => game
                .reveal_next(&mut events)
                .map(|_| true)
                .map_err(anyhow::Error::from),
            "close" => game
                .end_session(&mut events)
                .map(|_| true)
                .map_err(anyhow::Error::from),
            "seen" => cmd_seen(game, &args, &mut events),
            other => Err(anyhow::anyhow!("unknown command {other:?}, try 'help'")),
        };

        match outcome {
            Ok(mutated) => {
                drain_events(&mut events);
                if mutated || idle > 0 {
                    game.persist(store);
                }
            }
            Err(err) => {
                events.drain().for_each(drop);
                println!("error: {err}");
                if let Some(GameError::NotEnoughCoins { have, need }) = err.downcast_ref() {
                    println!("  {} more coins needed", need - have);
                }
            }
        }
    }
    Ok(())
}

fn cmd_click(game: &mut Game, args: &[&str], events: &mut EventBus) -> anyhow::Result<bool> {
    let times = match args.first() {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid click count {raw:?}"))?,
        None => 1,
    };
    let gained = game.clicks(times, events);
    println!("+{gained} coins ({} total)", game.state.coins);
    Ok(times > 0)
}

fn cmd_wait(game: &mut Game, args: &[&str], events: &mut EventBus) -> anyhow::Result<bool> {
    let raw = args.first().context("usage: wait <seconds>")?;
    let elapsed = raw
        .parse::<f64>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .with_context(|| format!("invalid duration {raw:?}"))?;
    let gained = game.tick_idle(elapsed, events);
    Ok(gained > 0)
}

fn cmd_buy(game: &mut Game, args: &[&str], events: &mut EventBus) -> anyhow::Result<bool> {
    let raw = args
        .first()
        .context("usage: buy <click|idle|discount|scout>")?;
    let kind = UpgradeKind::from_key(raw).with_context(|| format!("unknown upgrade {raw:?}"))?;
    let outcome = game.buy_upgrade(kind, events)?;
    match outcome.next_cost {
        Some(cost) => println!("next {} level costs {cost}", kind.key()),
        None => println!("{} is now maxed", kind.key()),
    }
    Ok(true)
}

fn cmd_chest(game: &mut Game, args: &[&str], events: &mut EventBus) -> anyhow::Result<bool> {
    let raw = args.first().context("usage: chest <common|rare|epic>")?;
    let kind = ChestKind::from_key(raw).with_context(|| format!("unknown chest {raw:?}"))?;
    let session = game.buy_chest(kind, events)?;
    println!(
        "{} holds {} cards, 'reveal' to flip them",
        session.chest().title,
        session.pulls().len()
    );
    Ok(true)
}

fn cmd_seen(game: &mut Game, args: &[&str], events: &mut EventBus) -> anyhow::Result<bool> {
    let (Some(card), Some(variant)) = (args.first(), args.get(1)) else {
        bail!("usage: seen <card> <normal|shiny>");
    };
    let variant = Variant::from_key(variant).with_context(|| format!("unknown variant {variant:?}"))?;
    let removed = game.acknowledge(&CardId::new(*card), variant, events);
    if !removed {
        println!("{card} {} was not marked new", variant_label(variant));
    }
    Ok(removed)
}

fn cmd_album(game: &Game, args: &[&str]) -> anyhow::Result<bool> {
    let page = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|page| *page >= 1)
            .with_context(|| format!("invalid page {raw:?}"))?,
        None => 1,
    };
    let progress = game.album_progress();
    println!(
        "album: {}/{} collected (normal {}/{}, shiny {}/{})",
        progress.owned(),
        progress.total(),
        progress.normal,
        progress.roster,
        progress.shiny,
        progress.roster
    );
    if progress.roster == 0 {
        // Nothing to collect.
    } else if progress.complete() {
        println!("every variant collected!");
    } else if progress.normal_complete() {
        println!("normal set complete, {} shiny to go", progress.roster - progress.shiny);
    } else if progress.shiny_complete() {
        println!("shiny set complete, {} normal to go", progress.roster - progress.normal);
    }
    let count = game.album_page_count();
    if count == 0 {
        println!("the album has no pages");
        return Ok(false);
    }
    let shown = page.min(count);
    println!("page {shown}/{count}");
    for row in game.album_page(shown - 1).chunks(3) {
        let cells: Vec<String> = row
            .iter()
            .map(|slot| match slot {
                None => "        ".to_string(),
                Some(slot) => {
                    let mark = match slot.display {
                        Some(Variant::Shiny) => "*",
                        Some(Variant::Normal) => "+",
                        None => "-",
                    };
                    let new = if slot.is_new { "!" } else { " " };
                    format!("[{}{mark}{new}]", slot.card)
                }
            })
            .collect();
        println!("  {}", cells.join(" "));
    }
    Ok(false)
}

fn print_help() {
    println!("commands:");
    println!("  click [n]                          earn coins by hand");
    println!("  wait <seconds>                     let idle income accrue");
    println!("  buy <click|idle|discount|scout>    buy an upgrade level");
    println!("  chest <common|rare|epic>           buy and open a chest");
    println!("  reveal                             flip the next card");
    println!("  close                              put away a finished chest");
    println!("  status | shop | album [page]       inspect the game");
    println!("  seen <card> <normal|shiny>         clear a new marker");
    println!("  quit");
}

fn print_status(game: &Game) {
    let state = &game.state;
    println!(
        "coins {} | click +{} | idle {}/s | discount lv {} | scout lv {}",
        state.coins, state.click_power, state.idle_per_sec, state.discount_level, state.scout_level
    );
    if let Some(session) = game.session() {
        println!(
            "open chest: {} ({}/{} revealed, {} to go)",
            session.chest().title,
            session.revealed_count(),
            session.pulls().len(),
            session.remaining()
        );
    }
    if !state.pending_new.is_empty() {
        let pending: Vec<String> = state.pending_new.iter().map(|key| key.compact()).collect();
        println!("new: {}", pending.join(", "));
    }
}

fn print_shop(game: &Game) {
    println!("upgrades:");
    for offer in game.upgrade_offers() {
        let price = match offer.next_cost {
            Some(cost) => cost.to_string(),
            None => "maxed".to_string(),
        };
        println!(
            "  {:<9} lv {:>2}  {:>10}{}",
            offer.kind.key(),
            offer.level,
            price,
            if offer.affordable { "" } else { "  (locked)" }
        );
    }
    println!("chests:");
    for offer in game.chest_offers() {
        println!(
            "  {:<9} {} cards  {:>6}  shiny {:.1}%{}",
            offer.kind.key(),
            offer.cards,
            offer.price,
            offer.shiny_base_chance * 100.0,
            if offer.affordable { "" } else { "  (locked)" }
        );
    }
}

fn variant_label(variant: Variant) -> &'static str {
    match variant {
        Variant::Normal => "normal",
        Variant::Shiny => "shiny",
    }
}

fn format_event(event: &Event) -> String {
    match event {
        Event::Clicked { gained, coins } => format!("+{gained} coins ({coins})"),
        Event::IdleIncome { gained, coins } => format!("idle +{gained} coins ({coins})"),
        Event::UpgradeBought {
            kind,
            level,
            cost,
            coins,
        } => format!("{} upgraded to lv {level} for {cost} ({coins} left)", kind.key()),
        Event::ChestBought {
            chest,
            price,
            pulls,
            coins,
        } => format!("bought {} chest for {price}: {pulls} cards ({coins} left)", chest.key()),
        Event::CardRevealed {
            card,
            variant,
            is_new,
            refund,
            index,
            total,
        } => {
            let tail = if *is_new {
                "NEW!".to_string()
            } else {
                format!("duplicate, refunded {refund}")
            };
            format!(
                "card {}/{total}: {card} {} - {tail}",
                index + 1,
                variant_label(*variant)
            )
        }
        Event::DuplicateRefunded { .. } => String::new(),
        Event::SessionClosed {
            chest,
            new_variants,
            refunded,
        } => format!(
            "{} chest closed: {new_variants} new, {refunded} coins refunded",
            chest.key()
        ),
        Event::VariantAcknowledged { card, variant } => {
            format!("{card} {} marked as seen", variant_label(*variant))
        }
    }
}

fn drain_events(events: &mut EventBus) {
    for event in events.drain() {
        let line = format_event(&event);
        if !line.is_empty() {
            println!("{line}");
        }
    }
}
