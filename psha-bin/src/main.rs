mod cmd_args;
use clap::Parser;
use psha_lib::calc::compute_hazard;
use psha_lib::config::{CalcConfig, demo_models};
use psha_lib::imt::Imt;
use psha_lib::readers::read_sites;
use psha_lib::writers::write_hazard_results;

use crate::cmd_args::CmdArgs;
use std::error::Error;

fn parse_imt(label: &str) -> Result<Imt, String> {
    match label.to_ascii_lowercase().as_str() {
        "pga" => Ok(Imt::Pga),
        "pgv" => Ok(Imt::Pgv),
        "sa0p3" => Ok(Imt::Sa0P3),
        "sa1p0" => Ok(Imt::Sa1P0),
        "sa3p0" => Ok(Imt::Sa3P0),
        other => Err(format!(
            "unknown imt `{other}`, expected pga, pgv, sa0p3, sa1p0 or sa3p0"
        )),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cmd_args = CmdArgs::parse();
    println!("{cmd_args:?}");

    let models = demo_models();

    if cmd_args.list_models {
        let mut keys: Vec<_> = models.keys().collect();
        keys.sort();
        for key in keys {
            println!("{}", key);
        }
    };

    if let Some(model_name) = cmd_args.show_model {
        match models.get(model_name.as_str()) {
            None => {
                println!("Model not found by name, use `--list-models` to see avaliable keys.")
            }
            Some(model) => println!("{model:#?}"),
        }
    };

    if let (Some(ref sites_file), Some(ref model_name)) = (cmd_args.sites_file, cmd_args.model) {
        println!("Use {sites_file} as input sites...");
        let delim = cmd_args.delimeter as u8;
        let sites = read_sites(sites_file, delim)?;
        println!("Loaded {} sites", sites.len());

        let model = match models.get(model_name.as_str()) {
            None => {
                return Err(
                    "Model not found by name, use `--list-models` to see avaliable keys.".into(),
                );
            }
            Some(model) => model,
        };

        let imt = parse_imt(&cmd_args.imt)?;
        let config = CalcConfig::builder().imts(vec![imt]).build()?;

        let pool = if cmd_args.parallel {
            Some(rayon::ThreadPoolBuilder::new().build()?)
        } else {
            None
        };
        println!(
            "Run {} in {} mode...",
            model.name(),
            if pool.is_some() { "parallel" } else { "sequential" }
        );

        let mut results = Vec::with_capacity(sites.len());
        for site in &sites {
            let result = compute_hazard(model, &config, site, pool.as_ref())?;
            results.push(result);
        }

        let out_file = &cmd_args.out_file;
        println!("Write hazard curves to {out_file}...");
        write_hazard_results(out_file, delim, &results, imt)?;
        println!("Done");
    };

    Ok(())
}
