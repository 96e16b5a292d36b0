use anyhow::{bail, Context, Result};
use std::env;

use swift_directory::{
    init_logging, initialize, CodeResolver, CodeStore, CsvRecordSource, DirectoryConfig,
    SqliteStore,
};

const USAGE: &str = "usage: swift-directory <import | count | show <code> | country <iso2> | delete <code>>";

fn main() -> Result<()> {
    init_logging("info");

    let args: Vec<String> = env::args().skip(1).collect();
    let config = DirectoryConfig::from_env().context("Failed to read configuration")?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["import"] => run_import(&store, &config),
        ["count"] => {
            println!("{}", store.count()?);
            Ok(())
        }
        ["show", code] => run_show(CodeResolver::new(store), code),
        ["country", iso2] => run_country(CodeResolver::new(store), iso2),
        ["delete", code] => {
            CodeResolver::new(store).delete(code)?;
            println!("Deleted {}", code.to_uppercase());
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

fn run_import(store: &SqliteStore, config: &DirectoryConfig) -> Result<()> {
    let source = CsvRecordSource::new(&config.seed_path);

    match initialize(store, &source).context("Import failed")? {
        Some(report) => {
            println!("Imported {} of {} records", report.persisted(), report.records_read);
            println!("  headquarters:      {}", report.headquarters);
            println!("  linked branches:   {}", report.linked_branches);
            println!("  unlinked branches: {}", report.unlinked_branches);
        }
        None => println!("Database already contains {} codes, nothing imported", store.count()?),
    }

    Ok(())
}

fn run_show(resolver: CodeResolver<SqliteStore>, code: &str) -> Result<()> {
    let details = resolver.find_with_branches(code)?;
    println!("{}", serde_json::to_string_pretty(&details.code)?);

    if let Some(branches) = details.branches {
        println!("{} branches:", branches.len());
        for branch in branches {
            println!("  {}  {}", branch.code, branch.address);
        }
    }

    Ok(())
}

fn run_country(resolver: CodeResolver<SqliteStore>, iso2: &str) -> Result<()> {
    for code in resolver.find_by_country(iso2)? {
        let kind = if code.is_headquarter() { "HQ" } else { "  " };
        println!("{} {}  {}", kind, code.code, code.bank_name);
    }

    Ok(())
}
