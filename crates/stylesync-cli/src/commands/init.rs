//! Library initialization and reset

use super::open_library;
use anyhow::Result;
use stylesync_studio::{Library, Studio};

pub fn run(demo: bool) -> Result<()> {
    let library = Library::default_library();

    if library.exists() {
        anyhow::bail!(
            "Library already exists at {}",
            library.library_path().display()
        );
    }

    let studio = if demo {
        Studio::with_demo_wardrobe()?
    } else {
        Studio::new()
    };
    library.save(&studio)?;

    println!("Created library at {}", library.library_path().display());
    if demo {
        println!("Added demo wardrobe: {} items", studio.items().len());
    }
    println!();
    println!("Next steps:");
    println!("  stylesync key set <GEMINI_API_KEY>");
    println!("  stylesync item add person ./me.jpg --name \"Me\"");
    println!("  stylesync generate batch --dry-run");

    Ok(())
}

pub fn run_reset(yes: bool) -> Result<()> {
    let (library, mut studio) = open_library()?;

    if !yes {
        anyhow::bail!(
            "This deletes {} items and {} outfits. Re-run with --yes to confirm.",
            studio.items().len(),
            studio.outfits().len()
        );
    }

    studio.reset();
    library.save(&studio)?;
    println!("Library cleared.");
    Ok(())
}
