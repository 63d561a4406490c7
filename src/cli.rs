// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn with_json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print output as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print output as JSON Lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("bunkbook")
        .about("Hostel administration: residents, fee ledger, occupancy analytics")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("resident")
                .about("Manage residents")
                .subcommand(
                    Command::new("add")
                        .about("Register a resident")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("room").long("room")),
                )
                .subcommand(with_json_flags(
                    Command::new("list").about("List residents"),
                )),
        )
        .subcommand(
            Command::new("occupancy")
                .about("Daily bed-occupancy history")
                .subcommand(
                    Command::new("record")
                        .about("Record one day's occupancy sample")
                        .arg(Arg::new("date").long("date").help("Defaults to today"))
                        .arg(
                            Arg::new("total-beds")
                                .long("total-beds")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("occupied-beds")
                                .long("occupied-beds")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(with_json_flags(
                    Command::new("list").about("List recorded samples").arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(usize))
                            .help("Trailing window in days (default 30)"),
                    ),
                )),
        )
        .subcommand(
            Command::new("invoice")
                .about("Fee invoices")
                .subcommand(
                    Command::new("add")
                        .about("Issue an invoice to a resident")
                        .arg(Arg::new("resident").long("resident").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("due").long("due").required(true))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("issued")
                                .long("issued")
                                .help("Issue date, defaults to today"),
                        ),
                )
                .subcommand(with_json_flags(
                    Command::new("list")
                        .about("List invoices, due date ascending")
                        .arg(Arg::new("status").long("status"))
                        .arg(Arg::new("resident").long("resident")),
                ))
                .subcommand(with_json_flags(
                    Command::new("show")
                        .about("Show one invoice with its payment history")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                )),
        )
        .subcommand(
            Command::new("payment")
                .about("Payments against invoices")
                .subcommand(
                    Command::new("add")
                        .about("Record a payment; updates the invoice status")
                        .arg(
                            Arg::new("invoice")
                                .long("invoice")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("method").long("method").required(true))
                        .arg(Arg::new("reference").long("reference"))
                        .arg(Arg::new("date").long("date").help("Defaults to today")),
                )
                .subcommand(with_json_flags(
                    Command::new("list").about("List payments").arg(
                        Arg::new("invoice")
                            .long("invoice")
                            .value_parser(value_parser!(i64)),
                    ),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Analytics and reporting")
                .subcommand(with_json_flags(
                    Command::new("fees")
                        .about("Invoiced vs paid totals bucketed by day")
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to")),
                ))
                .subcommand(with_json_flags(
                    Command::new("forecast")
                        .about("7-day occupancy forecast from recorded history")
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(value_parser!(usize))
                                .help("Historical window in days (default 30)"),
                        ),
                ))
                .subcommand(with_json_flags(
                    Command::new("summary").about("Headline occupancy and fee numbers"),
                )),
        )
        .subcommand(
            Command::new("import").about("Bulk import").subcommand(
                Command::new("occupancy")
                    .about("Import occupancy history from CSV (date,total_beds,occupied_beds)")
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("fees")
                        .about("Export the fee time series")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to")),
                )
                .subcommand(
                    Command::new("occupancy")
                        .about("Export occupancy history")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("set-currency")
                        .about("Set the display currency")
                        .arg(Arg::new("currency").required(true)),
                )
                .subcommand(Command::new("show").about("Show current settings")),
        )
        .subcommand(Command::new("doctor").about("Check stored data for integrity issues"))
}
