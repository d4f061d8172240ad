// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use anyhow::Result;

use chatledger::{cli, commands, config::Config, db, logging};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    logging::init(matches.get_flag("verbose"));

    let mut config = Config::from_env()?;
    if let Some(ctx) = matches.get_one::<String>("context") {
        config.context = ctx.clone();
    }
    let store = db::open_or_init(config.db_path.as_deref())?;
    let app = commands::App::new(config, Arc::new(store))?;

    commands::run(&app, &matches)?;
    Ok(())
}
