// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use clap::Parser;

use crate::clock::SystemClock;
use crate::cmd::due::print_due;
use crate::cmd::import::import_file;
use crate::cmd::stats::print_stats;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::review::server::start_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Review the cards that are due.
    Review {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// The port to use for the web server. Overrides the configuration file.
        #[arg(long)]
        port: Option<u16>,
        /// Don't open the browser automatically.
        #[arg(long)]
        no_open: bool,
    },
    /// Import a JSON file of generated cards as a new item.
    Import {
        /// Path to the JSON file.
        file: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Title of the item. By default, the file name is used.
        #[arg(long)]
        title: Option<String>,
        /// URL the content was captured from.
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the cards that are due, as JSON.
    Due {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print collection statistics, as JSON.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Review {
            directory,
            port,
            no_open,
        } => {
            let coll = Collection::new(directory)?;
            let port = port.unwrap_or(coll.config.port);
            let open_browser = coll.config.open_browser && !no_open;
            start_server(coll, port, open_browser, Arc::new(SystemClock)).await
        }
        Command::Import {
            file,
            directory,
            title,
            url,
        } => import_file(file, directory, title, url),
        Command::Due { directory } => print_due(directory),
        Command::Stats { directory } => print_stats(directory),
    }
}
