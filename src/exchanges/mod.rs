pub mod bitcoin_de;
