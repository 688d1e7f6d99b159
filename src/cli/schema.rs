use crate::cli::SchemaArgs;
use crate::config::Config;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    if args.defaults {
        print!("{}", serde_yaml::to_string(&Config::default())?);
        return Ok(());
    }

    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
