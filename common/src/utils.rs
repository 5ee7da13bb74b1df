//! File-naming conventions and the per-user RPC socket path.

use std::path::PathBuf;

/// Name of the intermediate file holding the records a map attempt
/// produced for one partition: `mr-<map task number>-<partition>`.
/// Task numbers are fresh per dispatch, so attempts never collide.
pub fn intermediate_file(map_task_number: u32, partition: u32) -> String {
    format!("mr-{}-{}", map_task_number, partition)
}

/// Name of the final output file for a partition: `mr-out-<partition>`.
pub fn output_file(partition: u32) -> String {
    format!("mr-out-{}", partition)
}

/// Unix domain socket the coordinator listens on, unique per invoking
/// user so concurrent jobs by different users do not collide. Lives in
/// /var/tmp since some networked home directories reject sockets.
pub fn coordinator_socket() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/var/tmp/mr-{}.sock", uid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_the_convention() {
        assert_eq!(intermediate_file(3, 1), "mr-3-1");
        assert_eq!(output_file(7), "mr-out-7");
    }

    #[test]
    fn socket_path_is_stable_within_a_process() {
        assert_eq!(coordinator_socket(), coordinator_socket());
        assert!(coordinator_socket().starts_with("/var/tmp"));
    }
}
