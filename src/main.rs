//! Headless world runner
//!
//! Drives the world the way a game loop would: stream around a moving player,
//! dig now and then, autosave, and save on exit.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glam::Vec3;

use cubeworld::{
    Autosave, BlockType, FileStorage, Inventory, PlayerSnapshot, StreamingConfig, World,
    WorldConfig, WorldError,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save directory, overrides the config
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Seed for a new world (random if omitted)
    #[arg(long)]
    seed: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the save (or start fresh) and walk the player around
    Run {
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// Blocks per tick
        #[arg(long, default_value_t = 0.25)]
        speed: f32,
        /// Walking direction in degrees, 0 = +x
        #[arg(long, default_value_t = 30.0)]
        heading: f32,
        #[arg(long, default_value_t = 20.0)]
        tick_rate: f32,
        /// Dig the block under the player every N ticks (0 disables)
        #[arg(long, default_value_t = 40)]
        dig_every: u32,
        /// Generate chunks on worker threads with a per-tick budget
        #[arg(long)]
        threaded: bool,
    },
    /// Wipe the save and start a new world
    New,
    /// Print a summary of the save
    Info,
    /// Delete the save
    Delete,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if args.save_dir.is_some() {
        config.save_dir = args.save_dir.clone();
    }
    if let Command::Run { threaded: true, .. } = args.command {
        config.streaming = StreamingConfig {
            radius: config.streaming.radius,
            hysteresis: config.streaming.hysteresis,
            ..StreamingConfig::threaded()
        };
    }
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    let save_dir = config.resolved_save_dir();
    tracing::info!("using save directory {}", save_dir.display());

    let mut world = World::with_config(seed, config.streaming.clone(), FileStorage::new(&save_dir));

    match args.command {
        Command::Run {
            ticks,
            speed,
            heading,
            tick_rate,
            dig_every,
            ..
        } => {
            let (position, inventory) = match world.load_world() {
                Ok(record) => (
                    record.player.position,
                    Inventory::from_slots(&record.player.inventory),
                ),
                Err(WorldError::NoSaveFound) => {
                    tracing::info!("no save found, starting a new world with seed {}", seed);
                    // Chunks flushed by a session that never saved its meta.
                    world.delete_world()?;
                    (Vec3::from_array(world.generator().spawn_position()), Inventory::new())
                }
                Err(e) => return Err(e.into()),
            };
            let walk = Walk {
                ticks,
                speed,
                heading,
                dt: 1.0 / tick_rate.max(1.0),
                dig_every,
            };
            simulate(&mut world, &config, position, inventory, walk)
        }
        Command::New => {
            world.delete_world()?;
            world.reset(seed);
            let spawn = PlayerSnapshot::new(
                Vec3::from_array(world.generator().spawn_position()),
                &Inventory::new(),
            );
            world.update(spawn.position);
            world.save_world(&spawn)?;
            println!("new world created with seed {}", seed);
            Ok(())
        }
        Command::Info => {
            let record = world.load_world()?;
            println!("version:   {}", record.version);
            println!("seed:      {}", record.seed);
            match record.saved_at {
                Some(at) => println!("saved at:  {}", at.to_rfc3339()),
                None => println!("saved at:  unknown"),
            }
            let p = record.player.position;
            println!("player:    ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
            println!("chunks:    {} edited", record.chunks.len());
            for stack in record.player.inventory.iter().filter(|s| !s.is_empty()) {
                println!("  {:>4} x {}", stack.count, stack.item.name());
            }
            Ok(())
        }
        Command::Delete => {
            world.delete_world()?;
            println!("save deleted");
            Ok(())
        }
    }
}

struct Walk {
    ticks: u32,
    speed: f32,
    heading: f32,
    dt: f32,
    dig_every: u32,
}

fn simulate(
    world: &mut World,
    config: &WorldConfig,
    mut position: Vec3,
    mut inventory: Inventory,
    walk: Walk,
) -> Result<(), Box<dyn Error>> {
    let (sin, cos) = walk.heading.to_radians().sin_cos();
    let step = Vec3::new(cos, 0.0, sin) * walk.speed;
    let mut autosave = Autosave::from_config(&config.autosave);

    for tick in 1..=walk.ticks {
        position += step;
        world.update(position);

        // Same gate physics uses: never act on terrain that is not there.
        if world.is_chunk_loaded(position.x, position.z) {
            position.y = standing_height(world, position);
            if walk.dig_every > 0 && tick % walk.dig_every == 0 {
                dig_below(world, &mut inventory, position);
            }
        }

        let snapshot = PlayerSnapshot::new(position, &inventory);
        autosave.tick(walk.dt, world, &snapshot);
    }

    let written = world.save_world(&PlayerSnapshot::new(position, &inventory))?;
    let stats = world.stats();
    tracing::info!(
        "walked to ({:.1}, {:.1}, {:.1}): {} generated, {} restored, {} evicted, {} flushed, {} chunks saved",
        position.x,
        position.y,
        position.z,
        stats.generated,
        stats.restored,
        stats.evicted,
        stats.flushed,
        written
    );
    Ok(())
}

/// Feet position on top of the highest solid block of the current column.
fn standing_height(world: &World, position: Vec3) -> f32 {
    let x = position.x.floor() as i32;
    let z = position.z.floor() as i32;
    (0..cubeworld::CHUNK_HEIGHT)
        .rev()
        .find(|&y| world.get_block(x, y, z).is_solid())
        .map_or(position.y, |y| (y + 1) as f32)
}

fn dig_below(world: &mut World, inventory: &mut Inventory, position: Vec3) {
    let x = position.x.floor() as i32;
    let y = position.y.floor() as i32 - 1;
    let z = position.z.floor() as i32;
    let block = world.get_block(x, y, z);

    let tool = inventory.hotbar()[0].item;
    let seconds = world.get_break_time(block.id(), tool.id());
    if block.is_air() || !seconds.is_finite() {
        return;
    }
    if world.set_block(x, y, z, BlockType::Air) && !inventory.add_item(block, 1) {
        tracing::debug!("inventory full, {} lost", block.name());
    }
    tracing::debug!("dug {} at ({}, {}, {}) in {:.2}s", block.name(), x, y, z, seconds);
}
