use std::path::PathBuf;

use extracto::db::{get_connection, init_db};
use extracto::error::Result;
use extracto::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    save_settings(&settings)?;

    let db_path = settings.db_path();
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    println!("Data directory: {}", data_dir.display());
    println!("Ledger:         {}", db_path.display());
    Ok(())
}
