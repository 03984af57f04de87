//! A subcommand making sure various things are working. Useful before
//! deploying a new version where you want to check as many things as
//! possible as early as possible.

use crate::{
    args::{self, Args},
    cms::SanityClient,
    collections::CollectionRegistry,
    config::Config,
    load_config_and_init_logger,
    prelude::*,
};


pub(crate) async fn run(shared: &args::Shared, args: &Args) -> Result<()> {
    let config = load_config_and_init_logger(shared, args)
        .context("failed to load config: cannot proceed with `check` command")?;


    // Perform main checks
    info!("Starting to verify various things...");
    let registry = check_registry(&config);
    let cms_config = config.cms.validate();
    let cms = check_cms(&config).await;
    info!("Done verifying various things");


    // Print summary after all log output
    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+blue+intense}Summary{/$}");
    println!();
    print_outcome(&mut any_errors, "Load configuration", &Ok(()));
    print_outcome(&mut any_errors, "Load generated collection registry", &registry);
    print_outcome(&mut any_errors, "Validate CMS configuration", &cms_config);
    print_outcome(&mut any_errors, "Connection to CMS", &cms);

    println!();
    if any_errors {
        bunt::println!("{$red+intense}➡  Errors have occurred!{/$}");
        std::process::exit(1);
    } else {
        bunt::println!("{$green+intense}⮕  Everything OK{/$} \
            {$dimmed}(Cairn probably works in this environment){/$}");
        println!("   ");
        Ok(())
    }
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => {
            bunt::println!(" ▸ {[bold+intense]}  {$green+bold}✔ ok{/$}", label);
        }
        Err(e) => {
            *any_errors = true;
            bunt::println!(" ▸ {[bold+intense]}  {$red+bold}✘ error{/$}", label);
            bunt::println!("      {$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
            println!();
            bunt::println!("      {$red+italic}Caused by:{/$}");

            for (i, cause) in e.chain().skip(1).enumerate() {
                print!("       {: >1$}", "", i * 2);
                println!("‣ {cause}");
            }
            println!();
        }
    }
}

fn check_registry(config: &Config) -> Result<()> {
    let registry = CollectionRegistry::load(&config.collections.generated_file)?;
    debug!("Collection registry: {registry:?}");
    Ok(())
}

async fn check_cms(config: &Config) -> Result<()> {
    let client = SanityClient::new(&config.cms)?;
    let pages = client.ping().await.context("failed to query the CMS")?;
    debug!("CMS reachable, {pages} pages in dataset '{}'", config.cms.dataset);
    Ok(())
}
