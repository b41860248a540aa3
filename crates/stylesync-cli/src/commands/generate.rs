//! Outfit generation commands

use super::{item_label, load_config, open_library, resolve_params, with_worker};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use stylesync_core::{ItemId, OutfitId};
use stylesync_studio::{Mixer, OutfitStatus, Studio};

#[derive(Args)]
pub struct ModelArgs {
    /// Model: flash or pro (defaults to config)
    #[arg(long)]
    model: Option<String>,

    /// Output size for the pro model: 1K, 2K, 4K
    #[arg(long)]
    resolution: Option<String>,

    /// Provider to use (gemini, mock)
    #[arg(long)]
    provider: Option<String>,
}

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Render every garment pair the person has not tried on yet
    Batch {
        /// Person item ID (defaults to the first person)
        #[arg(long)]
        person: Option<String>,

        #[command(flatten)]
        model: ModelArgs,

        /// Only list the pairs that would be rendered
        #[arg(long)]
        dry_run: bool,
    },

    /// Render one specific garment pair
    Pair {
        /// Upper garment item ID (defaults to the one at --upper-pos)
        #[arg(long)]
        upper: Option<String>,

        /// Lower garment item ID (defaults to the one at --lower-pos)
        #[arg(long)]
        lower: Option<String>,

        /// 1-based position in the upper garment list, wrapping past the end
        #[arg(long, default_value_t = 1, conflicts_with = "upper")]
        upper_pos: usize,

        /// 1-based position in the lower garment list, wrapping past the end
        #[arg(long, default_value_t = 1, conflicts_with = "lower")]
        lower_pos: usize,

        /// Person item ID (defaults to the first person)
        #[arg(long)]
        person: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Render outfits left pending by an earlier run
    Resume {
        /// Provider to use (gemini, mock)
        #[arg(long)]
        provider: Option<String>,
    },
}

pub fn run(cmd: GenerateCommands) -> Result<()> {
    match cmd {
        GenerateCommands::Batch {
            person,
            model,
            dry_run,
        } => run_batch(person.as_deref(), &model, dry_run),
        GenerateCommands::Pair {
            upper,
            lower,
            upper_pos,
            lower_pos,
            person,
            model,
        } => {
            let pick = PairPick {
                upper: upper.as_deref(),
                lower: lower.as_deref(),
                upper_pos,
                lower_pos,
            };
            run_pair(&pick, person.as_deref(), &model)
        }
        GenerateCommands::Resume { provider } => run_resume(provider.as_deref()),
    }
}

fn run_batch(person: Option<&str>, model: &ModelArgs, dry_run: bool) -> Result<()> {
    let (library, studio) = open_library()?;
    let config = load_config();
    let params = resolve_params(&config, model.model.as_deref(), model.resolution.as_deref())?;

    let person_arg = person.map(ItemId::from);
    let person = studio.resolve_person(person_arg.as_ref())?;
    let plan = studio.plan_batch(&person);

    println!(
        "{} new combination(s) for '{}' with {}",
        plan.len(),
        item_label(&studio, &person),
        params
    );
    for pair in &plan {
        println!(
            "  {} + {}",
            item_label(&studio, &pair.upper_id),
            item_label(&studio, &pair.lower_id)
        );
    }
    if dry_run || plan.is_empty() {
        return Ok(());
    }

    let (batch, studio) = with_worker(studio, model.provider.as_deref(), |handle| {
        let batch = handle.generate_batch(Some(&person), params)?;
        // Pending records reach disk before the first request goes out
        library.save(&handle.snapshot()?)?;
        handle.wait_idle()?;
        Ok(batch)
    })?;
    library.save(&studio)?;

    let ids: Vec<OutfitId> = batch.into_iter().map(|o| o.id).collect();
    print_summary(&studio, &ids);
    Ok(())
}

/// Garment choice for `generate pair`: explicit ids, or mixer positions
struct PairPick<'a> {
    upper: Option<&'a str>,
    lower: Option<&'a str>,
    upper_pos: usize,
    lower_pos: usize,
}

impl PairPick<'_> {
    fn resolve(&self, studio: &Studio) -> Result<(ItemId, ItemId)> {
        if let (Some(upper), Some(lower)) = (self.upper, self.lower) {
            return Ok((ItemId::from(upper), ItemId::from(lower)));
        }

        let mixer = Mixer::at(self.upper_pos.saturating_sub(1), self.lower_pos.saturating_sub(1));
        let (upper, lower) = mixer
            .current(studio)
            .context("Need at least one upper and one lower garment")?;
        Ok((
            self.upper.map(ItemId::from).unwrap_or_else(|| upper.id.clone()),
            self.lower.map(ItemId::from).unwrap_or_else(|| lower.id.clone()),
        ))
    }
}

fn run_pair(pick: &PairPick<'_>, person: Option<&str>, model: &ModelArgs) -> Result<()> {
    let (library, studio) = open_library()?;
    let config = load_config();
    let params = resolve_params(&config, model.model.as_deref(), model.resolution.as_deref())?;

    let person_arg = person.map(ItemId::from);
    let person = studio.resolve_person(person_arg.as_ref())?;
    let (upper, lower) = pick.resolve(&studio)?;
    println!(
        "Pair: {} + {}",
        item_label(&studio, &upper),
        item_label(&studio, &lower)
    );

    if let Some(existing) = studio.outfit_for(&person, &upper, &lower) {
        println!(
            "Pair already has outfit {} ({}); rendering again",
            existing.id,
            existing.status()
        );
    }

    let (outfit, studio) = with_worker(studio, model.provider.as_deref(), |handle| {
        let outfit = handle.generate_pair(Some(&person), &upper, &lower, params)?;
        handle.wait_idle()?;
        Ok(outfit)
    })?;
    library.save(&studio)?;

    print_summary(&studio, &[outfit.id]);
    Ok(())
}

fn run_resume(provider: Option<&str>) -> Result<()> {
    let (library, studio) = open_library()?;
    let pending: Vec<OutfitId> = studio
        .outfits()
        .with_status(OutfitStatus::Pending)
        .map(|o| o.id.clone())
        .collect();

    if pending.is_empty() {
        println!("No pending outfits.");
        return Ok(());
    }
    println!("Resuming {} pending outfit(s)", pending.len());

    let (_, studio) = with_worker(studio, provider, |handle| {
        handle.resume_pending()?;
        handle.wait_idle()
    })?;
    library.save(&studio)?;

    print_summary(&studio, &pending);
    Ok(())
}

fn print_summary(studio: &Studio, ids: &[OutfitId]) {
    let mut completed = 0;
    let mut failed = 0;
    for id in ids {
        let Some(outfit) = studio.outfits().get(id) else {
            continue;
        };
        match outfit.status() {
            OutfitStatus::Completed => completed += 1,
            OutfitStatus::Failed => {
                failed += 1;
                println!(
                    "  {} + {}: {}",
                    item_label(studio, &outfit.upper_id),
                    item_label(studio, &outfit.lower_id),
                    outfit.failure().unwrap_or("unknown error")
                );
            }
            _ => {}
        }
    }
    println!("\nDone: {} completed, {} failed", completed, failed);
    if failed > 0 {
        println!("Retry with `stylesync outfit retry <id>`");
    }
}
