// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn yes_flag() -> Arg {
    Arg::new("yes")
        .long("yes")
        .short('y')
        .action(ArgAction::SetTrue)
        .help("Skip the confirmation prompt")
}

pub fn build_cli() -> Command {
    Command::new("chatledger")
        .about("Turn chat messages into a multi-currency ledger")
        .version(clap::crate_version!())
        .arg(
            Arg::new("context")
                .long("context")
                .global(true)
                .help("Session context name (default: $CHATLEDGER_CONTEXT or 'default')"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the store and the default admin"))
        .subcommand(
            Command::new("login")
                .about("Log in; any other session of the account is superseded")
                .arg(Arg::new("username").long("username").short('u').required(true))
                .arg(Arg::new("password").long("password").short('p').required(true)),
        )
        .subcommand(Command::new("logout").about("Log out of this context"))
        .subcommand(Command::new("whoami").about("Show the logged-in account"))
        .subcommand(
            Command::new("watch")
                .about("Stay attached until this session is superseded by another login"),
        )
        .subcommand(
            Command::new("user")
                .about("Manage accounts (admin only)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("password").long("password").required(true))
                        .arg(
                            Arg::new("role")
                                .long("role")
                                .default_value("user")
                                .value_parser(["admin", "user"]),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("username").long("username").required(true)),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("username").long("username").required(true))
                        .arg(Arg::new("new-username").long("new-username"))
                        .arg(Arg::new("password").long("password"))
                        .arg(
                            Arg::new("role")
                                .long("role")
                                .value_parser(["admin", "user"]),
                        ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("ingest")
                        .about("Extract transactions from chat text (stdin when no --text/--file)")
                        .arg(Arg::new("text").long("text").conflicts_with("file"))
                        .arg(Arg::new("file").long("file")),
                )
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(Arg::new("description").long("description").default_value("")),
                )
                .subcommand(
                    json_flags(Command::new("list"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("amount").long("amount").allow_hyphen_values(true))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true)))
                .subcommand(Command::new("clear").arg(yes_flag())),
        )
        .subcommand(
            Command::new("rate")
                .about("Exchange rates (units per 1 USD)")
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(
                            Arg::new("value")
                                .long("value")
                                .required(true)
                                .allow_hyphen_values(true),
                        ),
                )
                .subcommand(
                    Command::new("add").arg(Arg::new("currency").long("currency").required(true)),
                ),
        )
        .subcommand(
            json_flags(Command::new("report"))
                .about("Per-currency balances and the USD total")
                .arg(Arg::new("out").long("out").help("Also write the report to a file")),
        )
        .subcommand(
            Command::new("backup")
                .about("JSON snapshots of the ledger")
                .subcommand(
                    Command::new("export")
                        .arg(Arg::new("out").long("out").conflicts_with("dir"))
                        .arg(Arg::new("dir").long("dir").default_value(".")),
                )
                .subcommand(
                    Command::new("import")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(yes_flag()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Tabular export")
                .subcommand(Command::new("csv").arg(Arg::new("out").long("out").required(true))),
        )
}
