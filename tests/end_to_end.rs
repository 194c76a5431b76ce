//! End-to-end authorization scenarios: prove, verify, and apply the
//! resulting ciphertexts the way the ledger would.

use curve25519_dalek::scalar::Scalar;
use rand::{rngs::StdRng, SeedableRng};

use veiled_balances::{
    combine_chunks, split_balance, AuthorizationProver, Balance, BulletproofsBackend,
    ElgamalKeys, EncryptedBalance, KeyRotationProver, NormalizationProver, TransferProver,
    WithdrawalProver, CHUNK_SIZE,
};

const ALICE_SEED: [u8; 32] = [1u8; 32];
const BOB_SEED: [u8; 32] = [2u8; 32];
const AUDITOR_SEED: [u8; 32] = [3u8; 32];
const RNG_SEED: [u8; 32] = [42u8; 32];

fn keys_from_seed(seed: [u8; 32]) -> ElgamalKeys {
    let mut rng = StdRng::from_seed(seed);
    ElgamalKeys::generate(&mut rng)
}

fn funded_account(keys: &ElgamalKeys, balance: Balance, rng: &mut StdRng) -> EncryptedBalance {
    let (_, enc_balance) = EncryptedBalance::encrypt(&keys.public, balance, rng);
    enc_balance
}

#[test]
fn withdraw_small_balance() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let alice = keys_from_seed(ALICE_SEED);
    let backend = BulletproofsBackend;
    let enc_balance = funded_account(&alice, 70, &mut rng);

    let prover = WithdrawalProver::new(&alice, &enc_balance, 15, &mut rng).unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(&alice.public, &enc_balance, 15, &backend, &mut rng)
        .unwrap();
    assert_eq!(proof.new_balance.decrypt(&alice.secret).unwrap(), 55);
}

#[cfg(feature = "discrete_log")]
#[test]
fn withdraw_large_balance() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let alice = keys_from_seed(ALICE_SEED);
    let backend = BulletproofsBackend;

    let balance: Balance = (1u128 << 64) + 100;
    let amount: u64 = (1u64 << 32) + 10;
    let enc_balance = funded_account(&alice, balance, &mut rng);

    let prover = WithdrawalProver::new(&alice, &enc_balance, amount, &mut rng).unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(&alice.public, &enc_balance, amount, &backend, &mut rng)
        .unwrap();

    // The new balance holds `2^64 - 2^32 + 90`; its middle chunk is too
    // large to brute-force, so confirm each chunk against the expected
    // plaintext instead of searching.
    let expected = split_balance(balance - amount as Balance);
    assert_eq!(expected, [90, u32::MAX as u64, 0, 0]);
    for (cipher, chunk) in proof.new_balance.ciphertexts().iter().zip(expected) {
        alice.secret.verify(cipher, &Scalar::from(chunk)).unwrap();
    }
}

#[test]
fn transfer_to_bob() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let alice = keys_from_seed(ALICE_SEED);
    let bob = keys_from_seed(BOB_SEED);
    let backend = BulletproofsBackend;

    let alice_balance = funded_account(&alice, 70, &mut rng);
    let bob_balance = funded_account(&bob, 20, &mut rng);

    let prover = TransferProver::new(
        &alice,
        &alice_balance,
        &bob.public,
        &[],
        10,
        &mut rng,
    )
    .unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(
            &alice.public,
            &bob.public,
            &[],
            &alice_balance,
            &backend,
            &mut rng,
        )
        .unwrap();

    // Bob decrypts the transferred amount from his ciphertexts.
    assert_eq!(proof.recipient_amount.decrypt(&bob.secret).unwrap(), 10);
    // Alice's replacement balance decrypts to the remainder.
    assert_eq!(proof.new_balance.decrypt(&alice.secret).unwrap(), 60);

    // The ledger applies the amount homomorphically to Bob's balance.
    let bob_updated = bob_balance + proof.recipient_amount;
    assert_eq!(bob_updated.decrypt(&bob.secret).unwrap(), 30);
}

#[test]
fn transfer_with_auditor() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let alice = keys_from_seed(ALICE_SEED);
    let bob = keys_from_seed(BOB_SEED);
    let auditor = keys_from_seed(AUDITOR_SEED);
    let backend = BulletproofsBackend;

    let alice_balance = funded_account(&alice, 70, &mut rng);
    let auditors = [auditor.public];

    let prover = TransferProver::new(
        &alice,
        &alice_balance,
        &bob.public,
        &auditors,
        10,
        &mut rng,
    )
    .unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(
            &alice.public,
            &bob.public,
            &auditors,
            &alice_balance,
            &backend,
            &mut rng,
        )
        .unwrap();

    // The auditor recovers the amount through its decryption handles.
    let auditor_view = proof.auditor_ciphertexts(0).unwrap();
    assert_eq!(auditor_view.decrypt(&auditor.secret).unwrap(), 10);

    // Verification under a substituted auditor key fails.
    let impostor = keys_from_seed([4u8; 32]);
    assert!(proof
        .verify(
            &alice.public,
            &bob.public,
            &[impostor.public],
            &alice_balance,
            &backend,
            &mut rng,
        )
        .is_err());
}

#[test]
fn rotate_key() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let old_keys = keys_from_seed(ALICE_SEED);
    let new_keys = keys_from_seed(BOB_SEED);
    let backend = BulletproofsBackend;
    let enc_balance = funded_account(&old_keys, 70, &mut rng);

    let prover = KeyRotationProver::new(&old_keys, &new_keys, &enc_balance, &mut rng).unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(
            &old_keys.public,
            &new_keys.public,
            &enc_balance,
            &backend,
            &mut rng,
        )
        .unwrap();

    // The new key decrypts the rotated balance; the old key cannot
    // locate the plaintext within a bounded window.
    assert_eq!(proof.new_balance.decrypt(&new_keys.secret).unwrap(), 70);
    for cipher in proof.new_balance.ciphertexts() {
        assert_eq!(old_keys.secret.decrypt_with_hint(cipher, 0, 1000), None);
    }
}

#[cfg(feature = "discrete_log")]
#[test]
fn normalize_overflowed_balance() {
    use veiled_balances::elgamal::CommitmentWitness;

    let mut rng = StdRng::from_seed(RNG_SEED);
    let alice = keys_from_seed(ALICE_SEED);
    let backend = BulletproofsBackend;

    // Chunk plaintexts left behind by homomorphic additions.
    let chunks = [CHUNK_SIZE + 100, CHUNK_SIZE + 200, CHUNK_SIZE + 300, 0];
    let value = combine_chunks(&chunks).unwrap();
    let witnesses: [CommitmentWitness; 4] = core::array::from_fn(|i| {
        CommitmentWitness::new(Scalar::from(chunks[i]), Scalar::random(&mut rng))
    });
    let enc_balance = EncryptedBalance::encrypt_with(&alice.public, &witnesses);

    let prover =
        NormalizationProver::new(&alice, &enc_balance, 2 * CHUNK_SIZE, &mut rng).unwrap();
    let proof = prover.authorize(&backend, &mut rng).unwrap();

    proof
        .verify(&alice.public, &enc_balance, &backend, &mut rng)
        .unwrap();

    let new_chunks = proof.new_balance.decrypt_chunks(&alice.secret).unwrap();
    assert!(new_chunks.iter().all(|chunk| *chunk < CHUNK_SIZE));
    assert_eq!(combine_chunks(&new_chunks).unwrap(), value);

    // Normalizing the already-normalized result is the identity on the
    // plaintext.
    let prover =
        NormalizationProver::new(&alice, &proof.new_balance, CHUNK_SIZE, &mut rng).unwrap();
    let again = prover.authorize(&backend, &mut rng).unwrap();
    again
        .verify(&alice.public, &proof.new_balance, &backend, &mut rng)
        .unwrap();
    assert_eq!(again.new_balance.decrypt(&alice.secret).unwrap(), value);
}
