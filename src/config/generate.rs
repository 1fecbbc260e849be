pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# FANIN CONFIGURATION
# =============================================================================
# Every field is optional; omitted values fall back to the defaults shown here.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/fanin/config.yml
#   3. /etc/fanin/config.yml
#
# Values may reference environment variables with the $env{...} syntax.

# =============================================================================
# PIPELINE
# =============================================================================
# Producer i emits i * items_per_producer + j for j in 0..items_per_producer
# into one shared channel. The channel closes once every producer is done.

pipeline:
  # Number of concurrent producer tasks
  producer_count: 10

  # Values emitted by each producer
  items_per_producer: 10

  # Slots in the shared channel. 1 keeps producers at most one value ahead
  # of the consumer.
  channel_capacity: 1

  # Stop producers after this long: 'infinite', or e.g. 250ms, 5s, 1m, 1h
  deadline: infinite

# =============================================================================
# COUNTER
# =============================================================================
# Tasks that each increment one mutex-guarded counter (`fanin count`).

counter:
  tasks: 100
"#
    .to_string()
}
