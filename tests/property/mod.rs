mod command_graph;
mod longest_prefix;
mod ttl;
