//! Compiled-in tool pins. Bumping a tool means bumping URL and hash together.

use crate::artifact::CachedArtifact;

const RUFF_URL: &str =
    "https://github.com/astral-sh/ruff/releases/download/0.9.6/ruff-x86_64-unknown-linux-gnu.tar.gz";
const RUFF_SHA256: &str = "bed850f15d4d5aaaef2b6a131bfecd5b9d7d3191596249d07e576bd9fd37078e";

const CLANG_FORMAT_URL: &str = "https://github.com/cpp-linter/clang-tools-static-binaries/releases/download/master-67c95218/clang-format-19_linux-amd64";
const CLANG_FORMAT_SHA256: &str =
    "6ede4977469da4325bb7109916e41c067f9e01fa3bddd3c90090c8609d8e364e";

/// ruff 0.9.6, x86_64 linux, shipped as a tarball with a top-level directory.
pub fn ruff() -> CachedArtifact {
    CachedArtifact::tar_gz(
        "ruff",
        "ruff-x86_64-unknown-linux-gnu.tar.gz",
        RUFF_URL,
        RUFF_SHA256,
        "ruff-x86_64-unknown-linux-gnu/ruff",
    )
}

/// clang-format 19, static x86_64 linux binary.
pub fn clang_format() -> CachedArtifact {
    CachedArtifact::binary(
        "clang-format",
        "clang-format",
        CLANG_FORMAT_URL,
        CLANG_FORMAT_SHA256,
    )
}
