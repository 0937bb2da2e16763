use hub_config::{FileStorage, LocalStorage, WORKSPACE_KEY};

pub fn cmd_selection_show() -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::open_default()?;
    match storage.get(WORKSPACE_KEY)? {
        Some(id) => println!("Selected workspace: {}", id),
        None => println!("No workspace selected."),
    }
    println!("  (stored in {})", storage.path().display());
    Ok(())
}

pub fn cmd_selection_clear() -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::open_default()?;
    storage.remove(WORKSPACE_KEY)?;
    println!("✓ Workspace selection cleared");
    Ok(())
}
